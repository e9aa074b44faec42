//! Canned selections over a store: the agenda, tasks coming due and
//! time totals.

use chrono::Duration;

use super::object::{CalendarEvent, CalendarObject, CalendarTask, RelationClass};
use super::store::{CalendarStore, SearchQuery};
use crate::error::StoreError;
use crate::timespec::{TimeZonePolicy, Timestamp};

/// Upcoming events followed by the tasks to work on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agenda {
    pub events: Vec<CalendarEvent>,
    pub tasks: Vec<CalendarTask>,
}

/// Events in `[now, end)` by start time, and open tasks starting or due
/// before `end`, at most `limit` of each.
///
/// Tasks with open children are left out; the children are what needs
/// doing. Undated tasks come first, then by start (or due) and priority.
pub fn agenda<S: CalendarStore + ?Sized>(
    store: &S,
    now: Timestamp,
    end: Timestamp,
    limit: usize,
    tz: &TimeZonePolicy,
) -> Result<Agenda, StoreError> {
    let mut events: Vec<CalendarEvent> = store
        .search(&SearchQuery::events().between(Some(now), Some(end)))?
        .into_iter()
        .filter_map(|object| match object {
            CalendarObject::Event(event) => Some(event),
            CalendarObject::Task(_) => None,
        })
        .collect();
    events.sort_by_key(|event| {
        let span = event.span(tz);
        (
            event.dtstart.map(|start| tz.ensure_ts(start)),
            span.map(|(begin, end)| end - begin),
        )
    });
    events.truncate(limit);

    let mut tasks = Vec::new();
    for task in open_tasks(store, None, Some(end))? {
        if !has_open_children(store, &task)? {
            tasks.push(task);
        }
    }
    tasks.sort_by_key(|task| (starts(task, tz), task.defined_priority().unwrap_or(0)));
    tasks.truncate(limit);

    Ok(Agenda { events, tasks })
}

/// Open tasks starting (or, without a start, due) no later than `end`,
/// most urgent first. Tasks without either date are skipped.
pub fn due_before<S: CalendarStore + ?Sized>(
    store: &S,
    end: Timestamp,
    tz: &TimeZonePolicy,
) -> Result<Vec<CalendarTask>, StoreError> {
    let mut tasks: Vec<CalendarTask> = open_tasks(store, None, None)?
        .into_iter()
        .filter(|task| starts(task, tz).is_some_and(|start| start <= end))
        .collect();
    tasks.sort_by_key(|task| (task.defined_priority().unwrap_or(0), starts(task, tz)));
    Ok(tasks)
}

/// Time the objects take: task estimates plus event spans.
///
/// Returns `None` if the sum leaves the representable range.
pub fn total_duration(objects: &[CalendarObject], tz: &TimeZonePolicy) -> Option<Duration> {
    objects.iter().try_fold(Duration::zero(), |sum, object| {
        let length = match object {
            CalendarObject::Task(task) => task.get_duration(tz),
            CalendarObject::Event(event) => event
                .span(tz)
                .map_or_else(Duration::zero, |(begin, end)| end - begin),
        };
        sum.checked_add(&length)
    })
}

fn starts(task: &CalendarTask, tz: &TimeZonePolicy) -> Option<Timestamp> {
    task.dtstart.or(task.due).map(|value| tz.ensure_ts(value))
}

fn open_tasks<S: CalendarStore + ?Sized>(
    store: &S,
    start: Option<Timestamp>,
    end: Option<Timestamp>,
) -> Result<Vec<CalendarTask>, StoreError> {
    Ok(store
        .search(&SearchQuery::todos().between(start, end))?
        .into_iter()
        .filter_map(|object| match object {
            CalendarObject::Task(task) => Some(task),
            CalendarObject::Event(_) => None,
        })
        .collect())
}

fn has_open_children<S: CalendarStore + ?Sized>(
    store: &S,
    task: &CalendarTask,
) -> Result<bool, StoreError> {
    for uid in task.related_uids(RelationClass::ChildLike) {
        if let Some(child) = store.task(uid)? {
            if !child.status.is_closed() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
