use clap::Args;
use plann_core::calendar::{due_before, CalendarStore, CalendarTask, RelationType};
use plann_core::postpone::Delay;
use plann_core::DurationSpec;
use tracing::info;

use super::postpone_interactively;
use crate::console::ConsoleDecider;
use crate::context::{CliResult, Context};

#[derive(Args)]
pub struct SplitArgs {
    /// Tasks estimated above this should be split into subtasks
    #[arg(long, default_value = "4h")]
    threshold: String,
    /// Ignore tasks starting further ahead than this
    #[arg(long, default_value = "60d")]
    lookahead: String,
    /// Only list the tasks that are too big
    #[arg(long)]
    non_interactive: bool,
}

/// Find upcoming tasks with a too big estimate and offer to fork out
/// subtasks.
pub fn run(ctx: &Context, args: SplitArgs) -> CliResult {
    let threshold = DurationSpec::parse(&args.threshold)?.to_duration();
    let now = ctx.tz.now();
    let end = ctx.after(now, &args.lookahead)?;
    let mut file = ctx.open_calendar()?;
    let huge: Vec<CalendarTask> = due_before(&file.calendar, end, &ctx.tz)?
        .into_iter()
        .filter(|task| task.get_duration(&ctx.tz) > threshold)
        .collect();

    if huge.is_empty() {
        println!("No task is estimated above {}", args.threshold);
        return Ok(());
    }

    let mut console = ConsoleDecider::new(args.non_interactive);
    for task in &huge {
        let hours = task.get_duration(&ctx.tz).num_minutes() as f64 / 60.0;
        println!("{}: estimate is {hours:.1}h, which is too big.", task.label());
        if args.non_interactive || !console.confirm("Do you want to fork out some subtasks?")? {
            continue;
        }

        let mut count = 1;
        let mut default = format!("Plan how to do {}", task.label());
        loop {
            let summary = console.ask_line("Name for the subtask", &default)?;
            default.clear();
            if summary.is_empty() {
                break;
            }
            let sub = CalendarTask::new(uuid::Uuid::new_v4().to_string(), summary)
                .with_relation(RelationType::Parent, task.uid.clone());
            info!(parent = %task.uid, sub = %sub.uid, "subtask added");
            file.calendar.add_task(sub)?;
            count += 1;
        }

        let mut parent = file.calendar.task(&task.uid)?.unwrap_or_else(|| task.clone());
        let suggestion = format!("{}h", task.get_duration(&ctx.tz).num_hours() / count + 1);
        let estimate =
            console.ask_line("What is the remaining estimate for the parent task?", &suggestion)?;
        parent.duration = Some(DurationSpec::parse(&estimate)?.to_duration());
        if let Some(due) = parent.due {
            parent.move_due(due, true, &ctx.tz);
        }
        let summary = console.ask_line("Summary of the parent task?", parent.label())?;
        parent.summary = Some(summary);
        file.calendar.update_task(parent)?;
        file.calendar.save(&task.uid)?;

        let answer = console.ask_line("Should we postpone the parent task?", "0h")?;
        let delay = Delay::parse(&answer, &ctx.tz)?;
        if !delay.is_zero() {
            let uids = [task.uid.clone()];
            postpone_interactively(ctx, &mut file.calendar, &mut console, &uids, &delay, now)?;
        }
    }
    file.persist()?;
    Ok(())
}
