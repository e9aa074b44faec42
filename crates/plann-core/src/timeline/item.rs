//! What a timeline slot can hold.

use std::fmt;

use serde::Serialize;

use crate::calendar::{CalendarEvent, CalendarTask};
use crate::timespec::Timestamp;

/// Occupant of a timeline slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Occupant {
    /// A task placed by the packing engine
    Task(CalendarTask),
    /// An immovable event
    Event(CalendarEvent),
    /// Enforced idle time
    Slack,
}

impl Occupant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::Event(_) => "event",
            Self::Slack => "slack",
        }
    }

    pub fn is_slack(&self) -> bool {
        matches!(self, Self::Slack)
    }

    pub fn as_task(&self) -> Option<&CalendarTask> {
        match self {
            Self::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::Task(task) => Some(&task.uid),
            Self::Event(event) => Some(&event.uid),
            Self::Slack => None,
        }
    }

    /// Human readable name for listings.
    pub fn label(&self) -> &str {
        match self {
            Self::Task(task) => task.label(),
            Self::Event(event) => event.label(),
            Self::Slack => "slack",
        }
    }
}

impl fmt::Display for Occupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A point where the timeline state changes.
///
/// The slot it starts runs until the next boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundary {
    pub begin: Timestamp,
    pub occupant: Option<Occupant>,
}

impl Boundary {
    pub fn free(begin: Timestamp) -> Self {
        Self {
            begin,
            occupant: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

/// A borrowed view of one slot.
///
/// `begin` is missing for the open past before the first boundary and
/// `end` for the open future after the last one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotView<'a> {
    pub begin: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub occupant: Option<&'a Occupant>,
}

impl<'a> SlotView<'a> {
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    /// Length when both ends are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.end? - self.begin?)
    }

    pub fn task(&self) -> Option<&'a CalendarTask> {
        self.occupant.and_then(Occupant::as_task)
    }

    /// Whether `ts` falls inside `[begin, end)`.
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.begin.map_or(true, |begin| begin <= ts) && self.end.map_or(true, |end| ts < end)
    }
}
