//! Calendar objects: tasks (VTODO) and events (VEVENT).

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::timespec::{DateOrTime, TimeZonePolicy, Timestamp};

/// RELTYPE of a RELATED-TO link. PARENT is the default when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationType {
    #[default]
    #[serde(rename = "PARENT")]
    Parent,
    #[serde(rename = "CHILD")]
    Child,
    #[serde(rename = "SIBLING")]
    Sibling,
    #[serde(rename = "FIRST")]
    First,
    #[serde(rename = "NEXT")]
    Next,
    #[serde(rename = "DEPENDS-ON")]
    DependsOn,
    #[serde(rename = "FINISHTOSTART")]
    FinishToStart,
    #[serde(rename = "STARTTOFINISH")]
    StartToFinish,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "PARENT",
            Self::Child => "CHILD",
            Self::Sibling => "SIBLING",
            Self::First => "FIRST",
            Self::Next => "NEXT",
            Self::DependsOn => "DEPENDS-ON",
            Self::FinishToStart => "FINISHTOSTART",
            Self::StartToFinish => "STARTTOFINISH",
        }
    }

    /// Which way this link points for traversal purposes.
    pub fn class(&self) -> RelationClass {
        match self {
            Self::Parent | Self::First | Self::DependsOn | Self::StartToFinish => {
                RelationClass::ParentLike
            }
            Self::Child | Self::Next | Self::FinishToStart => RelationClass::ChildLike,
            Self::Sibling => RelationClass::Sibling,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PARENT" => Ok(Self::Parent),
            "CHILD" => Ok(Self::Child),
            "SIBLING" => Ok(Self::Sibling),
            "FIRST" => Ok(Self::First),
            "NEXT" => Ok(Self::Next),
            "DEPENDS-ON" => Ok(Self::DependsOn),
            "FINISHTOSTART" => Ok(Self::FinishToStart),
            "STARTTOFINISH" => Ok(Self::StartToFinish),
            other => Err(format!("unknown relation type: {other}")),
        }
    }
}

/// Traversal class of a relation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationClass {
    ParentLike,
    ChildLike,
    Sibling,
}

impl RelationClass {
    /// The class a consistent back link must have.
    pub fn inverse(&self) -> Self {
        match self {
            Self::ParentLike => Self::ChildLike,
            Self::ChildLike => Self::ParentLike,
            Self::Sibling => Self::Sibling,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParentLike => "parent-like",
            Self::ChildLike => "child-like",
            Self::Sibling => "sibling",
        }
    }
}

/// One RELATED-TO property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default)]
    pub reltype: RelationType,
    pub uid: String,
}

impl Relation {
    pub fn new(reltype: RelationType, uid: impl Into<String>) -> Self {
        Self {
            reltype,
            uid: uid.into(),
        }
    }
}

/// VTODO status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum TaskStatus {
    #[default]
    NeedsAction,
    InProcess,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsAction => "NEEDS-ACTION",
            Self::InProcess => "IN-PROCESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Completed and cancelled tasks are never planned or postponed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('_', "-").as_str() {
            "NEEDS-ACTION" => Ok(Self::NeedsAction),
            "IN-PROCESS" => Ok(Self::InProcess),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// VEVENT status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Tentative,
    #[default]
    Confirmed,
    Cancelled,
}

/// A task as handed out by the calendar collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarTask {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateOrTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtstart: Option<DateOrTime>,
    /// Explicit DURATION, stored as seconds
    #[serde(default, with = "duration_secs", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
    /// 1 (most urgent) to 9; 0 or absent means undefined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
}

impl CalendarTask {
    /// Create a bare task with only a uid and summary
    pub fn new(uid: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            summary: Some(summary.into()),
            description: None,
            due: None,
            dtstart: None,
            duration: None,
            priority: None,
            status: TaskStatus::default(),
            categories: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_due(mut self, due: impl Into<DateOrTime>) -> Self {
        self.due = Some(due.into());
        self
    }

    pub fn with_dtstart(mut self, dtstart: impl Into<DateOrTime>) -> Self {
        self.dtstart = Some(dtstart.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_relation(mut self, reltype: RelationType, uid: impl Into<String>) -> Self {
        self.relations.push(Relation::new(reltype, uid));
        self
    }

    /// Summary, falling back to description and then uid.
    pub fn label(&self) -> &str {
        self.summary
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or(&self.uid)
    }

    /// Priority 1..=9, with 0 folded into "undefined".
    pub fn defined_priority(&self) -> Option<u8> {
        self.priority.filter(|p| *p > 0)
    }

    /// Explicit DURATION, else DUE - DTSTART, else zero.
    pub fn get_duration(&self, tz: &TimeZonePolicy) -> Duration {
        if let Some(duration) = self.duration {
            return duration;
        }
        match (self.due, self.dtstart) {
            (Some(due), Some(start)) => tz.ensure_ts(due) - tz.ensure_ts(start),
            _ => Duration::zero(),
        }
    }

    pub fn due_ts(&self, tz: &TimeZonePolicy) -> Option<Timestamp> {
        self.due.map(|due| tz.ensure_ts(due))
    }

    /// Move DUE, and DTSTART along with it when asked to.
    ///
    /// DTSTART is recomputed as `due - duration`; an all-day start stays
    /// all-day when both the new due and the duration are whole days.
    pub fn move_due(&mut self, due: DateOrTime, move_dtstart: bool, tz: &TimeZonePolicy) {
        if move_dtstart && self.dtstart.is_some() {
            let duration = self.get_duration(tz);
            let whole_days = duration.num_seconds() % 86_400 == 0;
            self.dtstart = Some(match due {
                DateOrTime::Date(date) if whole_days => DateOrTime::Date(date - duration),
                other => DateOrTime::DateTime(tz.ensure_ts(other) - duration),
            });
        }
        self.due = Some(due);
    }

    /// Uids of all relatives whose link falls in `class`.
    pub fn related_uids(&self, class: RelationClass) -> Vec<&str> {
        self.relations
            .iter()
            .filter(|rel| rel.reltype.class() == class)
            .map(|rel| rel.uid.as_str())
            .collect()
    }
}

/// An event as handed out by the calendar collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtstart: Option<DateOrTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtend: Option<DateOrTime>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
}

impl CalendarEvent {
    /// Create an event over `[dtstart, dtend)`
    pub fn new(
        uid: impl Into<String>,
        summary: impl Into<String>,
        dtstart: impl Into<DateOrTime>,
        dtend: impl Into<DateOrTime>,
    ) -> Self {
        Self {
            uid: uid.into(),
            summary: Some(summary.into()),
            dtstart: Some(dtstart.into()),
            dtend: Some(dtend.into()),
            status: EventStatus::default(),
            relations: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_relation(mut self, reltype: RelationType, uid: impl Into<String>) -> Self {
        self.relations.push(Relation::new(reltype, uid));
        self
    }

    pub fn label(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.uid)
    }

    /// The occupied interval. An all-day start without an end spans one
    /// day; anything else without both bounds has no span.
    pub fn span(&self, tz: &TimeZonePolicy) -> Option<(Timestamp, Timestamp)> {
        let start = self.dtstart?;
        let end = match (self.dtend, start) {
            (Some(end), _) => end,
            (None, DateOrTime::Date(date)) => DateOrTime::Date(date.succ_opt()?),
            (None, DateOrTime::DateTime(_)) => return None,
        };
        Some((tz.ensure_ts(start), tz.ensure_ts(end)))
    }

    /// Uids this event names as PARENT.
    pub fn parent_uids(&self) -> impl Iterator<Item = &str> {
        self.relations
            .iter()
            .filter(|rel| rel.reltype == RelationType::Parent)
            .map(|rel| rel.uid.as_str())
    }
}

/// Anything the collaborator can hand out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CalendarObject {
    Task(CalendarTask),
    Event(CalendarEvent),
}

impl CalendarObject {
    pub fn uid(&self) -> &str {
        match self {
            Self::Task(task) => &task.uid,
            Self::Event(event) => &event.uid,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Task(task) => task.label(),
            Self::Event(event) => event.label(),
        }
    }

    pub fn relations(&self) -> &[Relation] {
        match self {
            Self::Task(task) => &task.relations,
            Self::Event(event) => &event.relations,
        }
    }

    pub fn as_task(&self) -> Option<&CalendarTask> {
        match self {
            Self::Task(task) => Some(task),
            Self::Event(_) => None,
        }
    }
}

impl From<CalendarTask> for CalendarObject {
    fn from(task: CalendarTask) -> Self {
        Self::Task(task)
    }
}

impl From<CalendarEvent> for CalendarObject {
    fn from(event: CalendarEvent) -> Self {
        Self::Event(event)
    }
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<i64>::deserialize(deserializer)?
            .map(|secs| {
                Duration::try_seconds(secs).ok_or_else(|| {
                    serde::de::Error::custom(format!("duration of {secs} seconds is out of range"))
                })
            })
            .transpose()
    }
}
