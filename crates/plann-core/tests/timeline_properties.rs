//! Property tests for the interval timeline and the packing engine.

use chrono::{Duration, FixedOffset, TimeZone};
use plann_core::calendar::{CalendarObject, CalendarTask};
use plann_core::scheduler::{priority_rank, timeline_suggestion, PlanningOptions};
use plann_core::timeline::{Occupant, Timeline};
use plann_core::timespec::{TimeZonePolicy, Timestamp};
use proptest::prelude::*;

fn tz() -> TimeZonePolicy {
    TimeZonePolicy::fixed(FixedOffset::east_opt(0).unwrap())
}

fn origin() -> Timestamp {
    tz().implicit.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()
}

fn minute(n: i64) -> Timestamp {
    origin() + Duration::minutes(n)
}

fn occupant(n: usize) -> Occupant {
    let uid = format!("t{n}");
    Occupant::Task(CalendarTask::new(uid.clone(), uid))
}

/// Intervals as (start minute, length in minutes).
fn arb_intervals() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..2_000, 1i64..180), 0..40)
}

/// Tasks as (due in hours from origin, duration in hours, priority).
fn arb_tasks() -> impl Strategy<Value = Vec<(i64, i64, u8)>> {
    prop::collection::vec((1i64..300, 1i64..12, 0u8..=9), 1..20)
}

proptest! {
    #[test]
    fn prop_adds_keep_boundaries_ordered_and_disjoint(intervals in arb_intervals()) {
        let mut timeline = Timeline::new();
        let mut accepted = Vec::new();
        for (n, (start, len)) in intervals.into_iter().enumerate() {
            let (begin, end) = (minute(start), minute(start + len));
            if timeline.add(begin, end, occupant(n)).is_ok() {
                accepted.push((begin, end));
            }
        }

        prop_assert!(timeline.validate().is_ok());
        for pair in timeline.boundaries().windows(2) {
            prop_assert!(pair[0].begin < pair[1].begin);
        }
        // every accepted interval is still exactly one occupied slot
        for (begin, end) in accepted {
            let slot = timeline.get(begin);
            prop_assert_eq!(slot.begin, Some(begin));
            prop_assert_eq!(slot.end, Some(end));
            prop_assert!(slot.occupant.is_some());
        }
    }

    #[test]
    fn prop_get_bounds_the_point(intervals in arb_intervals(), point in -100i64..2_500) {
        let mut timeline = Timeline::new();
        for (n, (start, len)) in intervals.into_iter().enumerate() {
            let _ = timeline.add(minute(start), minute(start + len), occupant(n));
        }

        let ts = minute(point);
        let slot = timeline.get(ts);
        prop_assert!(slot.begin.map_or(true, |begin| begin <= ts));
        prop_assert!(slot.end.map_or(true, |end| ts < end));
        // the slot is exactly the stretch between two neighbouring boundaries
        if let (Some(begin), Some(end)) = (slot.begin, slot.end) {
            prop_assert!(!timeline
                .boundaries()
                .iter()
                .any(|b| b.begin > begin && b.begin < end));
        }
    }

    #[test]
    fn prop_filling_a_gap_keeps_boundary_count(
        first in 1i64..120,
        gap in 1i64..120,
        second in 1i64..120,
    ) {
        let mut timeline = Timeline::new();
        timeline.add(minute(0), minute(first), occupant(0)).unwrap();
        timeline
            .add(minute(first + gap), minute(first + gap + second), occupant(1))
            .unwrap();
        let before = timeline.len();

        timeline.add(minute(first), minute(first + gap), occupant(2)).unwrap();

        prop_assert_eq!(timeline.len(), before);
        prop_assert!(timeline.validate().is_ok());
    }

    #[test]
    fn prop_empty_timeline_has_unbounded_opening(
        deadline in 0i64..10_000,
        length in 1i64..600,
        balance in -600i64..600,
    ) {
        let timeline = Timeline::new();
        let slack = Duration::minutes(balance);
        let (opening, left) = timeline.find_opening(minute(deadline), Duration::minutes(length), slack);
        prop_assert!(opening.end.is_none());
        prop_assert_eq!(left, slack);
    }

    #[test]
    fn prop_packed_tasks_end_before_deadline(
        tasks in arb_tasks(),
        hours_per_day in 1u8..=24,
        horizon in 24i64..400,
    ) {
        let objects: Vec<CalendarObject> = tasks
            .iter()
            .enumerate()
            .map(|(n, (due, hours, priority))| {
                CalendarTask::new(format!("t{n}"), format!("task {n}"))
                    .with_due(origin() + Duration::hours(*due))
                    .with_duration(Duration::hours(*hours))
                    .with_priority(*priority)
                    .into()
            })
            .collect();
        let timeline_end = origin() + Duration::hours(horizon);
        let options = PlanningOptions::new(origin())
            .with_hours_per_day(f64::from(hours_per_day))
            .until(timeline_end);

        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();

        prop_assert!(timeline.validate().is_ok());
        prop_assert_eq!(timeline.task_slots().count(), objects.len());
        for slot in timeline.task_slots() {
            let task = slot.task().unwrap();
            let due = task.due_ts(&tz()).unwrap();
            let end = slot.end.unwrap();
            prop_assert!(end <= due.min(timeline_end));
            prop_assert_eq!(slot.duration(), task.duration);
        }
    }

    #[test]
    fn prop_absent_priority_sorts_last(priority in 1u8..=9) {
        prop_assert!(priority_rank(Some(priority)) < priority_rank(None));
        prop_assert_eq!(priority_rank(Some(0)), priority_rank(None));
    }
}
