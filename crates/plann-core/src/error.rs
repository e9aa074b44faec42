//! Core error types for plann-core.
//!
//! This module defines the error hierarchy using thiserror. Caller
//! errors (bad time expressions, overlapping inserts) and recoverable
//! scheduling conditions (dependency conflicts, inconsistent relations)
//! get distinct types so the CLI can decide what to surface.

use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

use crate::calendar::RelationType;
use crate::timespec::Timestamp;

/// Core error type for plann-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Time expression errors
    #[error("Time expression error: {0}")]
    TimeSpec(#[from] TimeSpecError),

    /// Timeline contract violations
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Postponement errors
    #[error("Postpone error: {0}")]
    Postpone(#[from] PostponeError),

    /// Calendar collaborator errors
    #[error("Calendar store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task edit errors
    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from parsing durations, timestamps and intervals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeSpecError {
    /// A duration like `3h` was expected
    #[error("A duration (like 3h for three hours) expected, but got: {0}")]
    InvalidDuration(String),

    /// Years can only be added as whole calendar years
    #[error("Fractional years are not supported: {0}")]
    FractionalYear(String),

    /// The timestamp could not be understood
    #[error("Could not parse timestamp: {0}")]
    InvalidTimestamp(String),

    /// The interval could not be understood
    #[error("Could not parse time interval: {0}")]
    InvalidInterval(String),

    /// The timezone name or offset could not be understood
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    /// Arithmetic left the representable range
    #[error("Time arithmetic overflow for {0}")]
    Overflow(String),
}

/// Contract violations when inserting into a timeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// `end` is not after `begin`
    #[error("Invalid interval: end ({end}) must be after begin ({begin})")]
    InvalidInterval { begin: Timestamp, end: Timestamp },

    /// The interval intersects something already on the timeline
    #[error("Interval {begin} - {end} overlaps an occupied slot starting at {occupied}")]
    Overlap {
        begin: Timestamp,
        end: Timestamp,
        occupied: Timestamp,
    },

    /// A structural invariant does not hold
    #[error("Timeline invariant broken at {at}: {reason}")]
    Corrupt { at: Timestamp, reason: &'static str },

    /// Slack would start before the earliest representable time
    #[error("Cannot pad {duration} of slack before {end}")]
    OutOfRange { end: Timestamp, duration: Duration },
}

/// One side of a relation as seen from a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationView {
    pub uid: String,
    pub reltypes: Vec<RelationType>,
}

/// A relation link whose back link does not match.
///
/// Each variant carries what `from` declares towards `to`, and what `to`
/// declares back towards `from`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InconsistentRelation {
    /// `to` has no RELATED-TO pointing back at `from`
    #[error("{} has {:?} link to {}, but no link back", .from.uid, .from.reltypes, .to.uid)]
    MissingBackLink { from: RelationView, to: RelationView },

    /// `to` points back at `from` with several relation types
    #[error("{} points back to {} with several relation types {:?}", .to.uid, .from.uid, .to.reltypes)]
    MultipleBackLinks { from: RelationView, to: RelationView },

    /// The back link exists but is of the wrong class
    #[error("{} has {:?} link to {}, but the link back is {:?}", .from.uid, .from.reltypes, .to.uid, .to.reltypes)]
    MismatchedBackLink { from: RelationView, to: RelationView },
}

/// Errors from the calendar collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No object with this uid
    #[error("Calendar object not found: {0}")]
    NotFound(String),

    /// The relation graph around an object is inconsistent
    #[error("Inconsistent relation: {0}")]
    Inconsistent(#[from] InconsistentRelation),

    /// Failed to read or write the calendar data
    #[error("Failed to access calendar data at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Calendar data is malformed
    #[error("Malformed calendar data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the postponement algorithm.
#[derive(Error, Debug)]
pub enum PostponeError {
    /// Recursion went too deep, most likely a loop in the relations
    #[error("Postponing {uid} recursed {depth} levels deep; probably a relationship loop")]
    RelationshipCycleSuspected { uid: String, depth: usize },

    /// The relation graph needs a manual fix first
    #[error("Inconsistent relation: {0}")]
    InconsistentRelation(InconsistentRelation),

    /// The delay could not be applied
    #[error(transparent)]
    TimeSpec(#[from] TimeSpecError),

    /// The collaborator failed
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for PostponeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Inconsistent(rel) => PostponeError::InconsistentRelation(rel),
            other => PostponeError::Store(other),
        }
    }
}

/// Errors from editing a task field by field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The attribute cannot be set
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The value does not fit the attribute
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// A one-line instruction was not understood
    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    /// A time value could not be parsed or applied
    #[error(transparent)]
    TimeSpec(#[from] TimeSpecError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_inconsistency_maps_to_postpone_variant() {
        let rel = InconsistentRelation::MissingBackLink {
            from: RelationView {
                uid: "a".into(),
                reltypes: vec![RelationType::Parent],
            },
            to: RelationView {
                uid: "b".into(),
                reltypes: vec![],
            },
        };
        let err: PostponeError = StoreError::Inconsistent(rel.clone()).into();
        assert!(matches!(err, PostponeError::InconsistentRelation(r) if r == rel));

        let err: PostponeError = StoreError::NotFound("x".into()).into();
        assert!(matches!(err, PostponeError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn messages_name_both_sides() {
        let rel = InconsistentRelation::MismatchedBackLink {
            from: RelationView {
                uid: "child".into(),
                reltypes: vec![RelationType::Parent],
            },
            to: RelationView {
                uid: "parent".into(),
                reltypes: vec![RelationType::Parent],
            },
        };
        let msg = rel.to_string();
        assert!(msg.contains("child"));
        assert!(msg.contains("parent"));
    }
}
