use clap::Args;
use plann_core::calendar::{agenda, total_duration, CalendarObject, CalendarStore};

use super::list::Selection;
use super::object_line;
use crate::context::{CliResult, Context};

#[derive(Args)]
pub struct AgendaArgs {
    /// How far ahead to look
    #[arg(long, default_value = "7d")]
    lookahead: String,
    /// At most this many events, and this many tasks
    #[arg(long, default_value_t = 16)]
    limit: usize,
}

/// Upcoming events, then the tasks to work on.
pub fn run(ctx: &Context, args: AgendaArgs) -> CliResult {
    let now = ctx.tz.now();
    let end = ctx.after(now, &args.lookahead)?;
    let file = ctx.open_calendar()?;
    let agenda = agenda(&file.calendar, now, end, args.limit, &ctx.tz)?;

    for event in agenda.events {
        println!("{}", object_line(ctx, &CalendarObject::Event(event)));
    }
    println!("======");
    for task in agenda.tasks {
        println!("{}", object_line(ctx, &CalendarObject::Task(task)));
    }
    Ok(())
}

#[derive(Args)]
pub struct SumHoursArgs {
    #[command(flatten)]
    selection: Selection,
}

/// Total of task estimates and event lengths in the selection.
pub fn run_sum_hours(ctx: &Context, args: SumHoursArgs) -> CliResult {
    let query = args.selection.query(ctx)?;
    let file = ctx.open_calendar()?;
    let objects = file.calendar.search(&query)?;
    let total = total_duration(&objects, &ctx.tz).ok_or("total duration is out of range")?;
    let hours = total.num_seconds() as f64 / 3600.0;
    println!("{hours:.2} hours in {} object(s)", objects.len());
    Ok(())
}
