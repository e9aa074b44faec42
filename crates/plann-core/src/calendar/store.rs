//! The calendar collaborator interface.
//!
//! Planning and postponement only ever talk to a calendar through
//! [`CalendarStore`]; how objects are fetched and persisted is up to the
//! implementation.

use serde::{Deserialize, Serialize};

use super::object::{CalendarEvent, CalendarObject, CalendarTask, RelationClass};
use crate::error::StoreError;
use crate::timespec::{DateOrTime, Timestamp};

/// Which object kinds a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectKinds {
    pub todo: bool,
    pub event: bool,
}

impl Default for ObjectKinds {
    fn default() -> Self {
        Self {
            todo: true,
            event: true,
        }
    }
}

/// Search by time range and object kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub kinds: ObjectKinds,
    /// Also return completed and cancelled tasks
    pub include_completed: bool,
}

impl SearchQuery {
    pub fn todos() -> Self {
        Self {
            kinds: ObjectKinds {
                todo: true,
                event: false,
            },
            ..Self::default()
        }
    }

    pub fn events() -> Self {
        Self {
            kinds: ObjectKinds {
                todo: false,
                event: true,
            },
            ..Self::default()
        }
    }

    pub fn between(mut self, start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Whether `[begin, end)` intersects the query window. Open bounds
    /// on either side always intersect.
    pub fn overlaps(&self, begin: Option<Timestamp>, end: Option<Timestamp>) -> bool {
        let after_start = match (self.start, end) {
            (Some(start), Some(end)) => end > start,
            _ => true,
        };
        let before_end = match (self.end, begin) {
            (Some(limit), Some(begin)) => begin < limit,
            _ => true,
        };
        after_start && before_end
    }
}

/// What `set_due` should do when a parent is due before the new due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyCheck {
    /// Move the due date regardless
    #[default]
    Off,
    /// Leave the task untouched and hand back the blocking parent
    Return,
}

/// Access to calendar objects.
pub trait CalendarStore {
    /// Objects matching the query.
    fn search(&self, query: &SearchQuery) -> Result<Vec<CalendarObject>, StoreError>;

    /// Load a single task.
    fn task(&self, uid: &str) -> Result<Option<CalendarTask>, StoreError>;

    /// Tasks linked from `uid` in the given class. Fails with
    /// [`StoreError::Inconsistent`] when a link has no matching back link.
    fn relatives(&self, uid: &str, class: RelationClass) -> Result<Vec<CalendarTask>, StoreError>;

    /// Move the due date, optionally dragging DTSTART along.
    ///
    /// With [`DependencyCheck::Return`], a PARENT-like relative due before
    /// `due` is returned and nothing is changed.
    fn set_due(
        &mut self,
        uid: &str,
        due: DateOrTime,
        move_dtstart: bool,
        check: DependencyCheck,
    ) -> Result<Option<CalendarTask>, StoreError>;

    /// Persist pending changes to an object.
    fn save(&mut self, uid: &str) -> Result<(), StoreError>;

    /// Store a new event.
    fn add_event(&mut self, event: CalendarEvent) -> Result<(), StoreError>;

    /// Store a new task.
    fn add_task(&mut self, task: CalendarTask) -> Result<(), StoreError>;

    /// Replace a stored task by uid. Pending until `save`.
    fn update_task(&mut self, task: CalendarTask) -> Result<(), StoreError>;

    /// Remove an object, returning what was removed.
    fn delete(&mut self, uid: &str) -> Result<CalendarObject, StoreError>;
}
