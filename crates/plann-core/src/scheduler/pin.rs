//! Pinning a suggested timeline to the calendar.

use tracing::info;

use crate::calendar::{CalendarEvent, CalendarStore, EventStatus, RelationType};
use crate::error::StoreError;
use crate::timeline::Timeline;
use crate::timespec::{TimeZonePolicy, Timestamp};

/// Turn every task slot starting after `after` into a tentative event.
///
/// Each event carries a PARENT link to its task, so a later packing run
/// treats the task as already planned. Returns the events created.
pub fn pin_timeline<S: CalendarStore + ?Sized>(
    timeline: &Timeline,
    after: Timestamp,
    store: &mut S,
    tz: &TimeZonePolicy,
) -> Result<Vec<CalendarEvent>, StoreError> {
    let mut created = Vec::new();
    for slot in timeline.task_slots() {
        let (Some(begin), Some(end), Some(task)) = (slot.begin, slot.end, slot.task()) else {
            continue;
        };
        if begin <= after {
            continue;
        }

        let event = CalendarEvent::new(
            uuid::Uuid::new_v4().to_string(),
            task.label(),
            tz.for_storage(begin.into()),
            tz.for_storage(end.into()),
        )
        .with_status(EventStatus::Tentative)
        .with_relation(RelationType::Parent, task.uid.clone());

        info!(task = %task.uid, event = %event.uid, %begin, %end, "pinned task slot");
        store.add_event(event.clone())?;
        created.push(event);
    }
    Ok(created)
}
