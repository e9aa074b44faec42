//! Questions the postponement walk may need answered.

use std::fmt;

use tracing::warn;

use crate::calendar::CalendarTask;
use crate::timespec::DateOrTime;

/// A yes/no question raised while postponing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    /// Postpone the whole family of a related task?
    Family { task: String },
    /// Postpone the parents, and with them their children?
    Parents { task: String },
    /// Postpone the children too?
    Children { task: String },
    /// A parent blocks the new due date; postpone the parent first?
    BlockingParent { task: String, parent: String },
}

impl Question {
    pub fn prompt(&self) -> String {
        match self {
            Self::Family { task } => format!(
                "\"{task}\" is related to other tasks. Postpone the whole family?"
            ),
            Self::Parents { task } => format!(
                "\"{task}\" has parents. Postpone them and all their children?"
            ),
            Self::Children { task } => {
                format!("\"{task}\" has children. Postpone the children too?")
            }
            Self::BlockingParent { task, parent } => format!(
                "\"{parent}\" is due before the new due of \"{task}\". Postpone \"{parent}\" first?"
            ),
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prompt())
    }
}

/// A task that could not be moved because a parent is due earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub task_uid: String,
    pub task_summary: String,
    pub parent_uid: String,
    pub parent_summary: String,
    pub parent_due: Option<DateOrTime>,
    pub parent_priority: Option<u8>,
}

impl Conflict {
    pub fn new(task: &CalendarTask, parent: &CalendarTask) -> Self {
        Self {
            task_uid: task.uid.clone(),
            task_summary: task.label().to_string(),
            parent_uid: parent.uid.clone(),
            parent_summary: parent.label().to_string(),
            parent_due: parent.due,
            parent_priority: parent.defined_priority(),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} could not be postponed due to parent {} with due ",
            self.task_summary, self.parent_summary
        )?;
        match &self.parent_due {
            Some(due) => write!(f, "{due}")?,
            None => f.write_str("(none)")?,
        }
        match self.parent_priority {
            Some(p) => write!(f, " and priority {p}"),
            None => f.write_str(" and no priority"),
        }
    }
}

/// Answers questions and receives conflict reports.
///
/// The CLI implements this against the terminal; library callers without
/// a user can use [`FixedDecider`].
pub trait Decider {
    fn resolve(&mut self, question: &Question) -> bool;

    fn report(&mut self, conflict: &Conflict);
}

/// Gives the same answer to every question and keeps a record.
#[derive(Debug, Clone, Default)]
pub struct FixedDecider {
    answer: bool,
    pub asked: Vec<Question>,
    pub reported: Vec<Conflict>,
}

impl FixedDecider {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn always_yes() -> Self {
        Self::new(true)
    }

    pub fn always_no() -> Self {
        Self::new(false)
    }
}

impl Decider for FixedDecider {
    fn resolve(&mut self, question: &Question) -> bool {
        self.asked.push(question.clone());
        self.answer
    }

    fn report(&mut self, conflict: &Conflict) {
        warn!(task = %conflict.task_uid, parent = %conflict.parent_uid, "{conflict}");
        self.reported.push(conflict.clone());
    }
}
