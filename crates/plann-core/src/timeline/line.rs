//! The interval timeline.

use tracing::debug;

use super::item::{Boundary, Occupant, SlotView};
use crate::calendar::CalendarEvent;
use crate::error::TimelineError;
use crate::timespec::{TimeZonePolicy, Timestamp};

/// Ordered, gap-free sequence of slots.
///
/// Stored as boundaries in strictly increasing `begin` order. Each
/// boundary starts a slot that runs until the next boundary; a boundary
/// without occupant is unallocated time. The last boundary is always
/// free, so the future stays open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub(super) boundaries: Vec<Boundary>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of boundaries.
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Occupy `[begin, end)`.
    ///
    /// The interval must lie in unallocated time. If a free boundary
    /// already starts at `begin` it is taken over; when the next boundary
    /// sits exactly at `end` as well, the boundary count is unchanged.
    pub fn add(&mut self, begin: Timestamp, end: Timestamp, occupant: Occupant) -> Result<(), TimelineError> {
        if end <= begin {
            return Err(TimelineError::InvalidInterval { begin, end });
        }

        let mut i = self.boundaries.partition_point(|b| b.begin <= begin);
        if let Some(next) = self.boundaries.get(i) {
            if next.begin < end {
                return Err(TimelineError::Overlap {
                    begin,
                    end,
                    occupied: next.begin,
                });
            }
        }
        if i > 0 && !self.boundaries[i - 1].is_free() {
            return Err(TimelineError::Overlap {
                begin,
                end,
                occupied: self.boundaries[i - 1].begin,
            });
        }

        if i > 0 && self.boundaries[i - 1].begin == begin {
            self.boundaries[i - 1].occupant = Some(occupant);
        } else {
            self.boundaries.insert(
                i,
                Boundary {
                    begin,
                    occupant: Some(occupant),
                },
            );
            i += 1;
        }

        if self.boundaries.get(i).map_or(true, |next| next.begin > end) {
            self.boundaries.insert(i, Boundary::free(end));
        }
        Ok(())
    }

    /// Place an event. An all-day event without end spans one day.
    ///
    /// Returns `Ok(false)` when the event has no usable bounds.
    pub fn add_event(&mut self, event: &CalendarEvent, tz: &TimeZonePolicy) -> Result<bool, TimelineError> {
        let Some((begin, end)) = event.span(tz) else {
            debug!(uid = %event.uid, "event without start or end, not placed");
            return Ok(false);
        };
        self.add(begin, end, Occupant::Event(event.clone()))?;
        Ok(true)
    }

    /// The slot containing `ts`.
    ///
    /// An empty timeline answers with an open slot starting at `ts`.
    pub fn get(&self, ts: Timestamp) -> SlotView<'_> {
        if self.boundaries.is_empty() {
            return SlotView {
                begin: Some(ts),
                end: None,
                occupant: None,
            };
        }
        let i = self.boundaries.partition_point(|b| b.begin <= ts);
        self.slot_before(i)
    }

    /// The slot ending at boundary `i`; `i == 0` is the open past.
    pub(super) fn slot_before(&self, i: usize) -> SlotView<'_> {
        let end = self.boundaries.get(i).map(|b| b.begin);
        match i.checked_sub(1).and_then(|prev| self.boundaries.get(prev)) {
            Some(prev) => SlotView {
                begin: Some(prev.begin),
                end,
                occupant: prev.occupant.as_ref(),
            },
            None => SlotView {
                begin: None,
                end,
                occupant: None,
            },
        }
    }

    /// All slots from the first boundary on, in order.
    pub fn slots(&self) -> impl Iterator<Item = SlotView<'_>> + '_ {
        (1..=self.boundaries.len()).map(move |i| self.slot_before(i))
    }

    /// Slots holding a task.
    pub fn task_slots(&self) -> impl Iterator<Item = SlotView<'_>> + '_ {
        self.slots().filter(|slot| slot.task().is_some())
    }

    /// Boundaries holding a task or event; slack is not counted.
    pub fn count(&self) -> usize {
        self.boundaries
            .iter()
            .filter(|b| b.occupant.as_ref().is_some_and(|o| !o.is_slack()))
            .count()
    }

    /// Check ordering and the open-ended tail.
    pub fn validate(&self) -> Result<(), TimelineError> {
        for pair in self.boundaries.windows(2) {
            if pair[1].begin <= pair[0].begin {
                return Err(TimelineError::Corrupt {
                    at: pair[1].begin,
                    reason: "boundaries out of order",
                });
            }
        }
        if let Some(last) = self.boundaries.last() {
            if !last.is_free() {
                return Err(TimelineError::Corrupt {
                    at: last.begin,
                    reason: "last boundary is occupied",
                });
            }
        }
        Ok(())
    }
}
