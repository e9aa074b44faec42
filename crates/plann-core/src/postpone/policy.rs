//! How far to postpone, and what to drag along.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimeSpecError;
use crate::timespec::{parse_dt, DateOrTime, DurationSpec, TimeZonePolicy, Want};

/// What to do when a parent is due before the new due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckDependent {
    /// Report the conflict and leave the task where it is
    #[default]
    Error,
    /// Report, then offer to postpone the parent first
    Interactive,
    /// Stop and hand the blocking parent back to the caller
    Return,
    /// Do not look at parents at all
    Off,
}

impl CheckDependent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Interactive => "interactive",
            Self::Return => "return",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for CheckDependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckDependent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "interactive" => Ok(Self::Interactive),
            "return" => Ok(Self::Return),
            "off" | "false" | "no" => Ok(Self::Off),
            other => Err(format!(
                "unknown dependency check mode '{other}' (expected error, interactive, return or off)"
            )),
        }
    }
}

/// A yes/no that may be deferred to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    #[default]
    No,
    Yes,
    Ask,
}

impl Choice {
    /// Only an explicit yes counts; an unanswered ask is a no.
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<bool> for Choice {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(Self::Yes),
            "no" | "n" | "false" => Ok(Self::No),
            "ask" | "interactive" => Ok(Self::Ask),
            other => Err(format!("expected yes, no or ask, got '{other}'")),
        }
    }
}

/// Propagation and conflict handling for one postponement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostponePolicy {
    pub check_dependent: CheckDependent,
    pub with_children: Choice,
    pub with_family: Choice,
    pub with_parent: Choice,
}

impl PostponePolicy {
    pub fn new(check_dependent: CheckDependent) -> Self {
        Self {
            check_dependent,
            ..Self::default()
        }
    }

    pub fn with_children(mut self, choice: Choice) -> Self {
        self.with_children = choice;
        self
    }

    pub fn with_family(mut self, choice: Choice) -> Self {
        self.with_family = choice;
        self
    }

    pub fn with_parent(mut self, choice: Choice) -> Self {
        self.with_parent = choice;
        self
    }

    /// Policy for walking down to children: children yes, nothing else.
    pub(crate) fn downwards(&self) -> Self {
        Self {
            check_dependent: self.check_dependent,
            with_children: Choice::Yes,
            with_family: Choice::No,
            with_parent: Choice::No,
        }
    }

    /// Policy for a single object with no propagation.
    pub(crate) fn alone(&self) -> Self {
        Self::new(self.check_dependent)
    }
}

/// How far to postpone.
#[derive(Debug, Clone, PartialEq)]
pub enum Delay {
    /// Relative to the later of now and the current due
    By(DurationSpec),
    /// An absolute new due
    Until(DateOrTime),
}

impl Delay {
    /// A duration expression such as `3d`, or else an absolute timestamp.
    pub fn parse(input: &str, tz: &TimeZonePolicy) -> Result<Self, TimeSpecError> {
        match DurationSpec::parse(input) {
            Ok(spec) => Ok(Self::By(spec)),
            Err(err @ TimeSpecError::Overflow(_)) => Err(err),
            Err(_) => parse_dt(input, Want::Auto, tz)
                .map(Self::Until)
                .map_err(|_| TimeSpecError::InvalidDuration(input.to_string())),
        }
    }

    /// Whether this delay moves nothing, e.g. `0h`.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::By(spec) => spec.to_duration().is_zero(),
            Self::Until(_) => false,
        }
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::By(spec) => write!(f, "+{spec}"),
            Self::Until(due) => write!(f, "{due}"),
        }
    }
}
