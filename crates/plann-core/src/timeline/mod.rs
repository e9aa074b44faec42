//! Interval timeline used by the packing engine.
//!
//! This module provides:
//! - Boundaries with optional occupants (task, event or slack)
//! - Point lookup and insertion with merge-on-touch
//! - Backward search for openings and slack padding

mod gap;
mod item;
mod line;

pub use gap::Opening;
pub use item::{Boundary, Occupant, SlotView};
pub use line::Timeline;
