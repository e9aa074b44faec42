//! Going through tasks one by one at a prompt.

use clap::Args;
use plann_core::calendar::{
    due_before, CalendarStore, CalendarTask, TaskCommand, TaskEdit, TaskStatus,
};
use plann_core::postpone::Delay;
use plann_core::Timestamp;
use tracing::warn;

use super::{postpone_interactively, show_when};
use crate::console::ConsoleDecider;
use crate::context::{CliResult, Context};
use crate::store::CalendarFile;

const INSTRUCTIONS: &str = "postpone <delay> / ignore / complete / cancel / set <key>=<value>?";

#[derive(Args)]
pub struct CheckDueArgs {
    /// Look at tasks starting or due within this long
    #[arg(long, default_value = "16h")]
    lookahead: String,
    /// At most this many tasks
    #[arg(long, default_value_t = 16)]
    limit: usize,
    /// Only list the tasks
    #[arg(long)]
    non_interactive: bool,
}

/// Overdue and soon-due tasks, most urgent first.
pub fn run(ctx: &Context, args: CheckDueArgs) -> CliResult {
    let now = ctx.tz.now();
    let end = ctx.after(now, &args.lookahead)?;
    let mut file = ctx.open_calendar()?;
    let mut tasks = due_before(&file.calendar, end, &ctx.tz)?;
    tasks.truncate(args.limit);

    if tasks.is_empty() {
        println!("Nothing due before {}", ctx.show(end));
        return Ok(());
    }

    let mut console = ConsoleDecider::new(args.non_interactive);
    for task in &tasks {
        if args.non_interactive {
            println!("{}", describe(ctx, task));
            continue;
        }
        work_on(ctx, &mut file, &mut console, task, now)?;
    }
    file.persist()?;
    Ok(())
}

fn describe(ctx: &Context, task: &CalendarTask) -> String {
    format!(
        "pri={} {} - {}: {}",
        task.defined_priority().unwrap_or(0),
        show_when(ctx, task.dtstart),
        show_when(ctx, task.due),
        task.label()
    )
}

/// Show a task and act on one instruction for it. Instructions that
/// cannot be understood are reported and the task is left alone.
pub(super) fn work_on(
    ctx: &Context,
    file: &mut CalendarFile,
    console: &mut ConsoleDecider,
    task: &CalendarTask,
    now: Timestamp,
) -> CliResult {
    println!("{}", describe(ctx, task));
    let answer = console.ask_line(INSTRUCTIONS, "ignore")?;
    let command = match TaskCommand::parse(&answer, &ctx.tz) {
        Ok(command) => command,
        Err(err) => {
            warn!(uid = %task.uid, %err, "ignoring instruction");
            eprintln!("{err} - ignoring");
            return Ok(());
        }
    };

    let edit = match command {
        TaskCommand::Ignore => return Ok(()),
        TaskCommand::Postpone(delay) => {
            let delay = Delay::parse(&delay, &ctx.tz)?;
            let uids = [task.uid.clone()];
            postpone_interactively(ctx, &mut file.calendar, console, &uids, &delay, now)?;
            return Ok(());
        }
        TaskCommand::Complete => TaskEdit {
            status: Some(TaskStatus::Completed),
            ..TaskEdit::default()
        },
        TaskCommand::Cancel => TaskEdit {
            status: Some(TaskStatus::Cancelled),
            ..TaskEdit::default()
        },
        TaskCommand::Edit(edit) => edit,
    };

    let mut current = file.calendar.task(&task.uid)?.unwrap_or_else(|| task.clone());
    edit.apply(&mut current, &ctx.tz)?;
    file.calendar.update_task(current)?;
    file.calendar.save(&task.uid)?;
    Ok(())
}
