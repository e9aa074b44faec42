//! Field edits to tasks, from command-line flags or from one-line
//! instructions like `set priority=3` typed at a prompt.

use std::str::FromStr;

use chrono::Duration;

use super::object::{CalendarTask, TaskStatus};
use crate::error::EditError;
use crate::timespec::{parse_dt, DateOrTime, DurationSpec, TimeZonePolicy, Want};

/// Changes to apply to a task. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub due: Option<DateOrTime>,
    pub dtstart: Option<DateOrTime>,
    pub duration: Option<Duration>,
    pub priority: Option<u8>,
    pub status: Option<TaskStatus>,
    /// Replaces the category list
    pub categories: Option<Vec<String>>,
    /// Appended after `categories` is applied
    pub add_categories: Vec<String>,
    /// Shifts DUE and DTSTART by this much
    pub shift: Option<DurationSpec>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set one attribute from its text form.
    ///
    /// Keys are `summary`, `description`, `due`, `dtstart`, `duration`,
    /// `priority`, `status` and `category` (comma separated).
    pub fn set(&mut self, key: &str, value: &str, tz: &TimeZonePolicy) -> Result<(), EditError> {
        let invalid = |message: String| EditError::InvalidValue {
            key: key.to_string(),
            message,
        };
        match key.to_ascii_lowercase().as_str() {
            "summary" => self.summary = Some(value.to_string()),
            "description" => self.description = Some(value.to_string()),
            "due" => self.due = Some(parse_dt(value, Want::Auto, tz)?),
            "dtstart" => self.dtstart = Some(parse_dt(value, Want::Auto, tz)?),
            "duration" => self.duration = Some(DurationSpec::parse(value)?.to_duration()),
            "priority" => {
                let priority: u8 = value.trim().parse().map_err(|_| invalid(value.to_string()))?;
                if priority > 9 {
                    return Err(invalid("priority must be between 0 and 9".to_string()));
                }
                self.priority = Some(priority);
            }
            "status" => self.status = Some(TaskStatus::from_str(value).map_err(invalid)?),
            "category" | "categories" => self.categories = Some(split_categories(value)),
            other => return Err(EditError::UnknownAttribute(other.to_string())),
        }
        Ok(())
    }

    /// Apply the edit. Timestamps are converted to the storage zone.
    pub fn apply(&self, task: &mut CalendarTask, tz: &TimeZonePolicy) -> Result<(), EditError> {
        if let Some(summary) = &self.summary {
            task.summary = Some(summary.clone());
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(due) = self.due {
            task.due = Some(tz.for_storage(due));
        }
        if let Some(dtstart) = self.dtstart {
            task.dtstart = Some(tz.for_storage(dtstart));
        }
        if let Some(duration) = self.duration {
            task.duration = Some(duration);
        }
        if let Some(priority) = self.priority {
            task.priority = Some(priority);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(categories) = &self.categories {
            task.categories = categories.clone();
        }
        for category in &self.add_categories {
            if !task.categories.contains(category) {
                task.categories.push(category.clone());
            }
        }
        if let Some(shift) = &self.shift {
            task.due = task
                .due
                .map(|due| shift.apply(due, tz).map(|v| tz.for_storage(v)))
                .transpose()?;
            task.dtstart = task
                .dtstart
                .map(|start| shift.apply(start, tz).map(|v| tz.for_storage(v)))
                .transpose()?;
        }
        Ok(())
    }
}

fn split_categories(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// What to do with a task, as typed at an interactive prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskCommand {
    Ignore,
    Complete,
    Cancel,
    /// Postpone through the relation-aware postponer
    Postpone(String),
    Edit(TaskEdit),
}

impl TaskCommand {
    /// Parse `ignore`, `complete`, `cancel`, `postpone <delay>` or
    /// `set <key>=<value>`.
    pub fn parse(line: &str, tz: &TimeZonePolicy) -> Result<Self, EditError> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match (word, rest) {
            ("" | "ignore", "") => Ok(Self::Ignore),
            ("complete", "") => Ok(Self::Complete),
            ("cancel", "") => Ok(Self::Cancel),
            ("postpone", delay) if !delay.is_empty() => Ok(Self::Postpone(delay.to_string())),
            ("set", assignment) => {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| EditError::UnknownInstruction(line.to_string()))?;
                let mut edit = TaskEdit::default();
                edit.set(key.trim(), value.trim(), tz)?;
                Ok(Self::Edit(edit))
            }
            _ => Err(EditError::UnknownInstruction(line.to_string())),
        }
    }
}
