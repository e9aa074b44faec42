pub mod add;
pub mod agenda;
pub mod config;
pub mod due;
pub mod edit;
pub mod list;
pub mod panic;
pub mod postpone;
pub mod relations;
pub mod split;
pub mod time;

use plann_core::calendar::{CalendarObject, InMemoryCalendar};
use plann_core::postpone::{CheckDependent, Delay, PostponePolicy, Postponer};
use plann_core::{DateOrTime, Timestamp};

use crate::console::ConsoleDecider;
use crate::context::{CliResult, Context};

/// A due/start value for display; dates stay dates.
fn show_when(ctx: &Context, value: Option<DateOrTime>) -> String {
    match value {
        Some(DateOrTime::Date(date)) => date.to_string(),
        Some(DateOrTime::DateTime(ts)) => ctx.show(ts),
        None => "-".to_string(),
    }
}

/// One line per object, as `list` and `agenda` print them.
fn object_line(ctx: &Context, object: &CalendarObject) -> String {
    match object {
        CalendarObject::Task(task) => format!(
            "todo  {:<20} due {:<24} pri {} {}  [{}]",
            task.uid,
            show_when(ctx, task.due),
            task.defined_priority().unwrap_or(0),
            task.label(),
            task.status.as_str()
        ),
        CalendarObject::Event(event) => format!(
            "event {:<20} at  {:<24} {}",
            event.uid,
            show_when(ctx, event.dtstart),
            event.label()
        ),
    }
}

/// Postpone from a prompt: parents in the way are offered for
/// postponement first. Returns how many tasks moved.
fn postpone_interactively(
    ctx: &Context,
    calendar: &mut InMemoryCalendar,
    console: &mut ConsoleDecider,
    uids: &[String],
    delay: &Delay,
    now: Timestamp,
) -> CliResult<usize> {
    let policy = PostponePolicy::new(CheckDependent::Interactive);
    let mut postponer = Postponer::new(calendar, console, ctx.tz).with_now(now);
    postponer.procrastinate(uids, delay, &policy)?;
    Ok(postponer.postponed().len())
}
