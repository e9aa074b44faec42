//! Deadline feasibility: pack tasks as late as possible before their due
//! time, around immovable events, under a daily work-hour budget.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, warn};

use crate::calendar::{
    CalendarEvent, CalendarObject, CalendarStore, CalendarTask, EventStatus, SearchQuery,
};
use crate::error::{ConfigError, CoreError};
use crate::timeline::{Occupant, Timeline};
use crate::timespec::{DateOrTime, DurationSpec, TimeZonePolicy, Timestamp};

/// Sort rank for tasks without a usable priority; after 9.
const UNDEFINED_PRIORITY_RANK: u16 = u16::MAX;

/// Inputs to [`timeline_suggestion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanningOptions {
    /// Hours of work available per day, in (0, 24]
    pub hours_per_day: f64,
    /// Nothing is planned after this
    pub timeline_end: Option<Timestamp>,
    /// Reference point for "late" and for which events count as future
    pub now: Timestamp,
}

impl PlanningOptions {
    pub fn new(now: Timestamp) -> Self {
        Self {
            hours_per_day: 4.0,
            timeline_end: None,
            now,
        }
    }

    pub fn with_hours_per_day(mut self, hours: f64) -> Self {
        self.hours_per_day = hours;
        self
    }

    pub fn until(mut self, end: Timestamp) -> Self {
        self.timeline_end = Some(end);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hours_per_day(self.hours_per_day)
    }

    /// Idle time owed for `duration` of work under the daily budget.
    fn slack_debit(&self, duration: Duration) -> Result<Duration, ConfigError> {
        let h = self.hours_per_day;
        let secs = (duration.num_seconds() as f64 * (24.0 - h) / h).round();
        (secs.is_finite() && secs.abs() < i64::MAX as f64)
            .then(|| Duration::try_seconds(secs as i64))
            .flatten()
            .ok_or_else(|| budget_too_small(h, duration))
    }
}

/// Reject daily budgets outside (0, 24].
pub fn validate_hours_per_day(hours: f64) -> Result<(), ConfigError> {
    if hours > 0.0 && hours <= 24.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: "planning.hours_per_day".to_string(),
            message: format!("must be more than 0 and at most 24, got {hours}"),
        })
    }
}

fn budget_too_small(hours: f64, duration: Duration) -> ConfigError {
    ConfigError::InvalidValue {
        key: "planning.hours_per_day".to_string(),
        message: format!("{hours} hours per day leaves no room for a task of {duration}"),
    }
}

/// Sort key rank: 1..=9 as is, undefined after 9.
pub fn priority_rank(priority: Option<u8>) -> u16 {
    match priority {
        Some(p) if p > 0 => u16::from(p),
        _ => UNDEFINED_PRIORITY_RANK,
    }
}

/// Build a timeline from `objects`: events as they are, tasks packed as
/// late as possible before their deadline.
///
/// Events that overlap and tasks that cannot be placed are logged and
/// skipped; only an invalid daily budget aborts the run.
pub fn timeline_suggestion(
    objects: &[CalendarObject],
    options: &PlanningOptions,
    tz: &TimeZonePolicy,
) -> Result<Timeline, ConfigError> {
    options.validate()?;
    let mut timeline = Timeline::new();

    // 1. Partition, dropping cancelled events and closed or empty tasks
    let events: Vec<&CalendarEvent> = objects
        .iter()
        .filter_map(|o| match o {
            CalendarObject::Event(e) if e.status != EventStatus::Cancelled => Some(e),
            _ => None,
        })
        .collect();
    let mut tasks: Vec<(&CalendarTask, Duration)> = objects
        .iter()
        .filter_map(CalendarObject::as_task)
        .filter(|t| !t.status.is_closed())
        .filter_map(|t| {
            let duration = t.get_duration(tz);
            if duration > Duration::zero() {
                Some((t, duration))
            } else {
                debug!(uid = %t.uid, "task without positive duration, not planned");
                None
            }
        })
        .collect();

    // 2. Tasks already pinned by a future event
    let pinned: HashSet<&str> = events
        .iter()
        .filter(|e| e.span(tz).is_some_and(|(_, end)| end > options.now))
        .flat_map(|e| e.parent_uids())
        .collect();

    // 3. Events
    for event in &events {
        if let Err(err) = timeline.add_event(event, tz) {
            warn!(uid = %event.uid, %err, "overlapping event skipped");
        }
    }

    // 4. Most urgent first; within a priority, earliest due first
    let far_future = options.timeline_end;
    tasks.sort_by(|(a, _), (b, _)| {
        priority_rank(a.priority)
            .cmp(&priority_rank(b.priority))
            .then_with(|| compare_due(a.due_ts(tz).or(far_future), b.due_ts(tz).or(far_future)))
    });

    // 5. Pack
    let mut slack_balance = Duration::zero();
    for (task, duration) in tasks {
        if pinned.contains(task.uid.as_str()) {
            debug!(uid = %task.uid, "task already on the calendar, skipped");
            continue;
        }
        let deadline = match (task.due_ts(tz), options.timeline_end) {
            (Some(due), Some(limit)) => due.min(limit),
            (Some(due), None) => due,
            (None, Some(limit)) => limit,
            (None, None) => {
                debug!(uid = %task.uid, "task without due and no timeline end, skipped");
                continue;
            }
        };

        if deadline.checked_sub_signed(duration).is_none() {
            warn!(uid = %task.uid, "task too long to place before its due date");
            continue;
        }
        slack_balance = slack_balance
            .checked_sub(&options.slack_debit(duration)?)
            .ok_or_else(|| budget_too_small(options.hours_per_day, duration))?;
        let (opening, balance) = timeline.find_opening(deadline, duration, slack_balance);
        slack_balance = balance;
        let end = opening.end.map_or(deadline, |end| deadline.min(end));
        let Some(begin) = end.checked_sub_signed(duration) else {
            warn!(uid = %task.uid, "no room left before the task's opening");
            continue;
        };

        if let Err(err) = timeline.add(begin, end, Occupant::Task(task.clone())) {
            warn!(uid = %task.uid, %err, "task could not be placed");
            continue;
        }
        debug!(uid = %task.uid, %begin, %end, slack = %slack_balance, "task placed");

        if slack_balance < Duration::zero() {
            if let Err(err) = timeline.pad_slack(begin, -slack_balance) {
                warn!(uid = %task.uid, %err, "slack could not be padded");
            }
            slack_balance = Duration::zero();
        }
    }

    Ok(timeline)
}

/// Earlier due first; a missing due sorts last.
fn compare_due(a: Option<Timestamp>, b: Option<Timestamp>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A task slot on a suggested timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LateTask {
    pub uid: String,
    pub summary: String,
    pub due: Option<DateOrTime>,
    pub priority: Option<u8>,
    /// Begin of the planned slot
    pub should_have_started: Timestamp,
    pub planned_end: Option<Timestamp>,
}

impl LateTask {
    pub(crate) fn from_slot(task: &CalendarTask, begin: Timestamp, end: Option<Timestamp>) -> Self {
        Self {
            uid: task.uid.clone(),
            summary: task.label().to_string(),
            due: task.due,
            priority: task.defined_priority(),
            should_have_started: begin,
            planned_end: end,
        }
    }
}

/// Window and budget for [`check_for_panic`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanicOptions {
    pub hours_per_day: f64,
    /// Defaults to now
    pub timeline_start: Option<Timestamp>,
    /// Defaults to one year after the start
    pub timeline_end: Option<Timestamp>,
}

impl Default for PanicOptions {
    fn default() -> Self {
        Self {
            hours_per_day: 4.0,
            timeline_start: None,
            timeline_end: None,
        }
    }
}

impl PanicOptions {
    fn window(&self, tz: &TimeZonePolicy) -> Result<(Timestamp, Timestamp), CoreError> {
        let start = self.timeline_start.unwrap_or_else(|| tz.now());
        let end = match self.timeline_end {
            Some(end) => end,
            None => {
                let year = DurationSpec::parse("1y")?;
                tz.ensure_ts(year.apply(DateOrTime::DateTime(start), tz)?)
            }
        };
        Ok((start, end))
    }
}

/// Result of [`check_for_panic`].
#[derive(Debug, Clone)]
pub struct PanicReport {
    pub timeline_start: Timestamp,
    pub timeline_end: Timestamp,
    pub timeline: Timeline,
    /// Tasks whose slot begins before the start, in timeline order
    pub late: Vec<LateTask>,
}

impl PanicReport {
    pub fn is_panic(&self) -> bool {
        !self.late.is_empty()
    }
}

/// Run the packing engine over everything the store has in the window
/// and list the tasks that should already have been started.
pub fn check_for_panic<S: CalendarStore + ?Sized>(
    store: &S,
    options: &PanicOptions,
    tz: &TimeZonePolicy,
) -> Result<PanicReport, CoreError> {
    let (start, end) = options.window(tz)?;

    let mut objects = store.search(&SearchQuery::todos().between(None, Some(end)))?;
    objects.extend(store.search(&SearchQuery::events().between(Some(start), Some(end)))?);

    let planning = PlanningOptions::new(start)
        .with_hours_per_day(options.hours_per_day)
        .until(end);
    let timeline = timeline_suggestion(&objects, &planning, tz)?;
    let late = late_tasks(&timeline, start);

    Ok(PanicReport {
        timeline_start: start,
        timeline_end: end,
        timeline,
        late,
    })
}

/// Task slots beginning before `now`.
pub fn late_tasks(timeline: &Timeline, now: Timestamp) -> Vec<LateTask> {
    timeline
        .task_slots()
        .filter_map(|slot| {
            let begin = slot.begin?;
            let task = slot.task()?;
            (begin < now).then(|| LateTask::from_slot(task, begin, slot.end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{RelationType, TaskStatus};
    use chrono::{FixedOffset, TimeZone};

    fn tz() -> TimeZonePolicy {
        TimeZonePolicy::fixed(FixedOffset::east_opt(0).unwrap())
    }

    fn now() -> Timestamp {
        tz().implicit.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn task(uid: &str, due: Timestamp, hours: i64) -> CalendarTask {
        CalendarTask::new(uid, uid)
            .with_due(due)
            .with_duration(Duration::hours(hours))
    }

    fn slot_of<'a>(timeline: &'a Timeline, uid: &str) -> crate::timeline::SlotView<'a> {
        timeline
            .task_slots()
            .find(|s| s.task().is_some_and(|t| t.uid == uid))
            .unwrap()
    }

    #[test]
    fn priority_rank_puts_undefined_last() {
        assert!(priority_rank(Some(9)) < priority_rank(None));
        assert_eq!(priority_rank(Some(0)), priority_rank(None));
        assert!(priority_rank(Some(1)) < priority_rank(Some(2)));
    }

    #[test]
    fn rejects_bad_daily_budget() {
        for hours in [0.0, -1.0, 24.5] {
            let options = PlanningOptions::new(now()).with_hours_per_day(hours);
            assert!(matches!(
                timeline_suggestion(&[], &options, &tz()),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn tiny_daily_budget_does_not_panic() {
        let due = now() + Duration::hours(5);
        let objects = vec![task("a", due, 1).into()];

        // the debit fits in a Duration but not on the calendar
        let options = PlanningOptions::new(now()).with_hours_per_day(1e-9);
        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();
        assert_eq!(slot_of(&timeline, "a").end, Some(due));

        let options = PlanningOptions::new(now()).with_hours_per_day(1e-12);
        assert!(matches!(
            timeline_suggestion(&objects, &options, &tz()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn tasks_end_at_their_due_with_full_days() {
        let t1 = now() + Duration::hours(5);
        let t2 = now() + Duration::hours(8);
        let objects = vec![task("a", t1, 1).into(), task("b", t2, 1).into()];
        let options = PlanningOptions::new(now()).with_hours_per_day(24.0);
        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();
        assert_eq!(slot_of(&timeline, "a").end, Some(t1));
        assert_eq!(slot_of(&timeline, "b").end, Some(t2));
        assert!(late_tasks(&timeline, now()).is_empty());
    }

    #[test]
    fn daily_budget_pads_slack_before_task() {
        let due = now() + Duration::hours(1);
        let objects = vec![task("a", due, 3).into()];
        let options = PlanningOptions::new(now()).with_hours_per_day(8.0);
        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();

        let slot = slot_of(&timeline, "a");
        assert_eq!(slot.begin, Some(due - Duration::hours(3)));
        let before = timeline.get(due - Duration::hours(4));
        assert!(before.occupant.is_some_and(Occupant::is_slack));
        assert_eq!(before.begin, Some(due - Duration::hours(9)));

        let late = late_tasks(&timeline, now());
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].should_have_started, due - Duration::hours(3));
    }

    #[test]
    fn same_due_lower_priority_number_gets_later_slot() {
        let due = now() + Duration::hours(10);
        let objects = vec![
            task("low", due, 1).with_priority(5).into(),
            task("high", due, 1).with_priority(1).into(),
            task("undefined", due, 1).into(),
        ];
        let options = PlanningOptions::new(now()).with_hours_per_day(24.0);
        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();
        assert_eq!(slot_of(&timeline, "high").end, Some(due));
        assert_eq!(slot_of(&timeline, "low").end, Some(due - Duration::hours(1)));
        assert_eq!(slot_of(&timeline, "undefined").end, Some(due - Duration::hours(2)));
    }

    #[test]
    fn tasks_are_packed_around_events() {
        let due = now() + Duration::hours(4);
        let meeting = CalendarEvent::new("m", "meeting", due - Duration::hours(1), due + Duration::hours(1));
        let objects = vec![meeting.into(), task("a", due, 2).into()];
        let options = PlanningOptions::new(now()).with_hours_per_day(24.0);
        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();
        let slot = slot_of(&timeline, "a");
        assert_eq!(slot.end, Some(due - Duration::hours(1)));
        assert_eq!(slot.begin, Some(due - Duration::hours(3)));
        timeline.validate().unwrap();
    }

    #[test]
    fn deadline_is_capped_by_timeline_end() {
        let end = now() + Duration::hours(6);
        let objects = vec![
            task("far", now() + Duration::days(3), 1).into(),
            CalendarTask::new("undated", "undated")
                .with_duration(Duration::hours(1))
                .into(),
        ];
        let options = PlanningOptions::new(now()).with_hours_per_day(24.0).until(end);
        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();
        for slot in timeline.task_slots() {
            assert!(slot.end.unwrap() <= end);
        }
        assert_eq!(timeline.count(), 2);
    }

    #[test]
    fn skips_closed_pinned_and_cancelled() {
        let due = now() + Duration::hours(5);
        let pin = CalendarEvent::new("pin", "pinned", now() + Duration::hours(1), now() + Duration::hours(2))
            .with_relation(RelationType::Parent, "pinned");
        let cancelled = CalendarEvent::new("c", "cancelled", due - Duration::hours(1), due)
            .with_status(EventStatus::Cancelled);
        let objects = vec![
            pin.into(),
            cancelled.into(),
            task("pinned", due, 1).into(),
            task("done", due, 1).with_status(TaskStatus::Completed).into(),
            CalendarTask::new("empty", "empty").with_due(due).into(),
            task("open", due, 1).into(),
        ];
        let options = PlanningOptions::new(now()).with_hours_per_day(24.0);
        let timeline = timeline_suggestion(&objects, &options, &tz()).unwrap();
        let uids: Vec<&str> = timeline.task_slots().filter_map(|s| s.task()).map(|t| t.uid.as_str()).collect();
        assert_eq!(uids, vec!["open"]);
        // pin event plus the open task
        assert_eq!(timeline.count(), 2);
        assert_eq!(slot_of(&timeline, "open").end, Some(due));
    }

    #[test]
    fn overlapping_events_do_not_abort() {
        let a = CalendarEvent::new("a", "a", now(), now() + Duration::hours(2));
        let b = CalendarEvent::new("b", "b", now() + Duration::hours(1), now() + Duration::hours(3));
        let options = PlanningOptions::new(now());
        let timeline = timeline_suggestion(&[a.into(), b.into()], &options, &tz()).unwrap();
        assert_eq!(timeline.count(), 1);
    }
}
