use clap::Subcommand;
use plann_core::calendar::{CalendarEvent, CalendarStore, CalendarTask, RelationType};
use plann_core::timespec::parse_timespec;
use tracing::info;

use super::edit::SetArgs;
use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum AddAction {
    /// Add a task with the given summary
    Todo {
        /// Summary words
        summary: Vec<String>,
        #[command(flatten)]
        set: SetArgs,
        /// Parent task; may be repeated
        #[arg(long)]
        parent: Vec<String>,
    },
    /// Add an event at TIMESPEC, like 2025-11-25+5d or "2025-11-30 19:00+2h"
    Event {
        summary: String,
        timespec: String,
        /// Parent task; may be repeated
        #[arg(long)]
        parent: Vec<String>,
    },
}

pub fn run(ctx: &Context, action: AddAction) -> CliResult {
    let mut file = ctx.open_calendar()?;
    let uid = uuid::Uuid::new_v4().to_string();

    match action {
        AddAction::Todo {
            summary,
            set,
            parent,
        } => {
            let mut task = CalendarTask::new(uid.clone(), summary.join(" "));
            set.to_edit(ctx)?.apply(&mut task, &ctx.tz)?;
            if task.summary.as_deref().map_or(true, |s| s.trim().is_empty()) {
                return Err("denying to add a task with no summary".into());
            }
            for parent in parent {
                task = task.with_relation(RelationType::Parent, parent);
            }
            file.calendar.add_task(task)?;
            info!(%uid, "task added");
        }
        AddAction::Event {
            summary,
            timespec,
            parent,
        } => {
            let (start, end) = parse_timespec(&timespec, &ctx.tz)?;
            let Some(end) = end else {
                return Err(format!("no end time in '{timespec}'; try something like {timespec}+1h").into());
            };
            let mut event = CalendarEvent::new(
                uid.clone(),
                summary,
                ctx.tz.for_storage(start),
                ctx.tz.for_storage(end),
            );
            for parent in parent {
                event = event.with_relation(RelationType::Parent, parent);
            }
            file.calendar.add_event(event)?;
            info!(%uid, "event added");
        }
    }

    file.persist()?;
    println!("uid={uid}");
    Ok(())
}
