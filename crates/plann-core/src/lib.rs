//! # plann Core Library
//!
//! Panic planning for calendar tasks: given tasks with due dates and a
//! daily work-hour budget, decide whether everything can be done in time,
//! and if not, show what has to be postponed.
//!
//! ## Architecture
//!
//! - **Time arithmetic**: duration expressions, timestamp parsing and an
//!   explicit timezone policy
//! - **Timeline**: sorted, gap-aware intervals with merge-on-touch
//! - **Scheduler**: packs tasks as late as possible around events, with
//!   slack enforcing the daily budget
//! - **Postpone**: moves due dates across the parent/child relation graph
//! - **Calendar**: the object model and the store the engines talk to
//!
//! ## Key Components
//!
//! - [`timeline_suggestion`]: the packing engine
//! - [`check_for_panic`]: packing plus the list of late tasks
//! - [`Postponer`]: dependency-aware postponement
//! - [`CalendarStore`]: trait for the calendar collaborator
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod error;
pub mod postpone;
pub mod scheduler;
pub mod storage;
pub mod timeline;
pub mod timespec;

pub use calendar::{
    CalendarEvent, CalendarObject, CalendarStore, CalendarTask, InMemoryCalendar, RelationClass,
    RelationGraph, RelationType, SearchQuery,
};
pub use error::{
    ConfigError, CoreError, EditError, InconsistentRelation, PostponeError, StoreError, TimeSpecError,
    TimelineError,
};
pub use postpone::{CheckDependent, Choice, Decider, Delay, PostponePolicy, Postponer};
pub use scheduler::{
    check_for_panic, pin_timeline, timeline_suggestion, triage, PanicOptions, PanicReport,
    PlanningOptions,
};
pub use storage::Config;
pub use timeline::{Occupant, Timeline};
pub use timespec::{DateOrTime, DurationSpec, TimeZonePolicy, Timestamp};
