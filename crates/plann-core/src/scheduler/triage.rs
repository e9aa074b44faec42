//! Deciding what to postpone when the timeline is in panic.
//!
//! Late tasks are looked at one priority at a time, starting with the
//! least urgent: undefined first, then 9 down to 1.

use serde::Serialize;

use super::panic::LateTask;
use crate::timeline::Timeline;
use crate::timespec::{round_up_to_spec, Timestamp};

/// What to do with the late tasks of one priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Postpone them by the suggested delay
    Postpone,
    /// Priority 1: cannot be postponed at all
    HighPriority,
    /// Priority 2: should not be postponed, consider cancelling
    CannotPostpone,
}

impl Verdict {
    pub fn is_panic(&self) -> bool {
        !matches!(self, Self::Postpone)
    }

    fn for_priority(priority: Option<u8>) -> Self {
        match priority {
            Some(1) => Self::HighPriority,
            Some(2) => Self::CannotPostpone,
            _ => Self::Postpone,
        }
    }
}

/// One priority's worth of late tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageStep {
    /// `None` for tasks without a defined priority
    pub priority: Option<u8>,
    /// Tasks of this priority that should already have started
    pub late: Vec<LateTask>,
    /// Tasks of this priority planned after now
    pub later: Vec<LateTask>,
    /// Half the lateness of the earliest late task, rounded up
    pub suggested_delay: String,
    pub verdict: Verdict,
}

/// Priorities from least to most urgent.
fn ranks() -> impl Iterator<Item = Option<u8>> {
    std::iter::once(None).chain((1..=9).rev().map(Some))
}

/// Every priority that has late tasks, least urgent first.
pub fn triage_steps(timeline: &Timeline, now: Timestamp) -> Vec<TriageStep> {
    ranks()
        .filter_map(|priority| step_for(timeline, now, priority))
        .collect()
}

/// The first priority that needs attention, if any.
pub fn triage(timeline: &Timeline, now: Timestamp) -> Option<TriageStep> {
    ranks().find_map(|priority| step_for(timeline, now, priority))
}

fn step_for(timeline: &Timeline, now: Timestamp, priority: Option<u8>) -> Option<TriageStep> {
    let mut late = Vec::new();
    let mut later = Vec::new();
    for slot in timeline.task_slots() {
        let (Some(begin), Some(task)) = (slot.begin, slot.task()) else {
            continue;
        };
        if task.defined_priority() != priority {
            continue;
        }
        let entry = LateTask::from_slot(task, begin, slot.end);
        if begin < now {
            late.push(entry);
        } else {
            later.push(entry);
        }
    }

    let earliest = late.first()?.should_have_started;
    Some(TriageStep {
        priority,
        suggested_delay: round_up_to_spec((now - earliest) / 2),
        verdict: Verdict::for_priority(priority),
        late,
        later,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarTask;
    use crate::timeline::Occupant;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn now() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 12, 0, 0)
            .unwrap()
    }

    fn place(timeline: &mut Timeline, uid: &str, priority: Option<u8>, begin_h: i64, hours: i64) {
        let mut task = CalendarTask::new(uid, uid);
        task.priority = priority;
        let begin = now() + Duration::hours(begin_h);
        timeline
            .add(begin, begin + Duration::hours(hours), Occupant::Task(task))
            .unwrap();
    }

    #[test]
    fn nothing_late_means_no_triage() {
        let mut timeline = Timeline::new();
        place(&mut timeline, "a", Some(5), 1, 1);
        assert!(triage(&timeline, now()).is_none());
    }

    #[test]
    fn least_urgent_priority_comes_first() {
        let mut timeline = Timeline::new();
        place(&mut timeline, "p3", Some(3), -10, 2);
        place(&mut timeline, "p7", Some(7), -6, 2);
        place(&mut timeline, "p7-later", Some(7), 2, 1);
        place(&mut timeline, "undefined", Some(0), -4, 1);

        let steps = triage_steps(&timeline, now());
        let order: Vec<_> = steps.iter().map(|s| s.priority).collect();
        assert_eq!(order, vec![None, Some(7), Some(3)]);

        let step = triage(&timeline, now()).unwrap();
        assert_eq!(step.priority, None);
        assert_eq!(step.late[0].uid, "undefined");

        let seven = &steps[1];
        assert_eq!(seven.late.len(), 1);
        assert_eq!(seven.later.len(), 1);
        assert_eq!(seven.later[0].uid, "p7-later");
        assert_eq!(seven.verdict, Verdict::Postpone);
        // six hours late, half rounded up to hours
        assert_eq!(seven.suggested_delay, "4h");
    }

    #[test]
    fn urgent_priorities_are_panic() {
        let mut timeline = Timeline::new();
        place(&mut timeline, "p2", Some(2), -50, 1);
        place(&mut timeline, "p1", Some(1), -3, 1);
        let steps = triage_steps(&timeline, now());
        assert_eq!(steps[0].verdict, Verdict::CannotPostpone);
        assert_eq!(steps[0].suggested_delay, "2d");
        assert_eq!(steps[1].verdict, Verdict::HighPriority);
        assert!(steps.iter().all(|s| s.verdict.is_panic()));
    }
}
