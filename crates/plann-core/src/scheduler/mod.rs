//! Panic planning.
//!
//! This module provides:
//! - The packing engine that builds a timeline suggestion from tasks and events
//! - The panic check listing tasks that should already have been started
//! - Triage of late tasks by priority
//! - Pinning planned task slots as tentative events

mod panic;
mod pin;
mod triage;

pub use panic::{
    check_for_panic, late_tasks, priority_rank, timeline_suggestion, validate_hours_per_day,
    LateTask, PanicOptions, PanicReport, PlanningOptions,
};
pub use pin::pin_timeline;
pub use triage::{triage, triage_steps, TriageStep, Verdict};
