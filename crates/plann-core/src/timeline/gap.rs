//! Searching the timeline backwards for free time, and padding slack.

use chrono::Duration;
use serde::Serialize;

use super::item::Occupant;
use super::line::Timeline;
use crate::error::TimelineError;
use crate::timespec::Timestamp;

/// A free slot returned by [`Timeline::find_opening`].
///
/// A missing `begin` means the opening reaches into the open past, a
/// missing `end` that it reaches into the open future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Opening {
    pub begin: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl Opening {
    /// Whether the opening has no bound on at least one side.
    pub fn is_unbounded(&self) -> bool {
        self.begin.is_none() || self.end.is_none()
    }

    /// Length when both ends are known
    pub fn duration(&self) -> Option<Duration> {
        Some(self.end? - self.begin?)
    }
}

impl Timeline {
    /// Walk backwards from `last_possibility - duration` to the first free
    /// slot that can hold `duration`.
    ///
    /// Free slots passed over because they are too short are added to the
    /// slack balance. The search stops at an unbounded slot even if it is
    /// occupied by nothing at all, as on an empty timeline.
    pub fn find_opening(
        &self,
        last_possibility: Timestamp,
        duration: Duration,
        slack_balance: Duration,
    ) -> (Opening, Duration) {
        let mut slack = slack_balance;
        let latest_start = last_possibility - duration;
        let mut i = self.boundaries.partition_point(|b| b.begin <= latest_start);

        loop {
            let slot = self.slot_before(i);
            let (Some(begin), Some(end)) = (slot.begin, slot.end) else {
                return (
                    Opening {
                        begin: slot.begin,
                        end: slot.end,
                    },
                    slack,
                );
            };
            if slot.is_free() {
                let len = end - begin;
                if len >= duration {
                    return (
                        Opening {
                            begin: Some(begin),
                            end: Some(end),
                        },
                        slack,
                    );
                }
                slack += len;
            }
            i -= 1;
        }
    }

    /// Mark `duration` of the free time closest before `end` as slack.
    ///
    /// Occupied slots are stepped over. Whatever cannot be placed in free
    /// slots goes in front of the first boundary.
    pub fn pad_slack(&mut self, end: Timestamp, duration: Duration) -> Result<(), TimelineError> {
        let mut end = end;
        let mut remaining = duration;
        let mut i = self.boundaries.partition_point(|b| b.begin < end);

        while i > 0 && remaining > Duration::zero() {
            i -= 1;
            let begin = self.boundaries[i].begin;
            if !self.boundaries[i].is_free() {
                end = begin;
                continue;
            }
            let take = (end - begin).min(remaining);
            self.add(end - take, end, Occupant::Slack)?;
            remaining -= take;
            end -= take;
        }

        if remaining > Duration::zero() {
            let begin = end
                .checked_sub_signed(remaining)
                .ok_or(TimelineError::OutOfRange {
                    end,
                    duration: remaining,
                })?;
            self.add(begin, end, Occupant::Slack)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarTask;
    use chrono::{FixedOffset, TimeZone};

    fn ts(day: u32, hour: u32, minute: u32) -> Timestamp {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 2, day, hour, minute, 0)
            .unwrap()
    }

    fn task(uid: &str) -> Occupant {
        Occupant::Task(CalendarTask::new(uid, uid))
    }

    fn sample() -> Timeline {
        let mut timeline = Timeline::new();
        timeline.add(ts(25, 20, 0), ts(25, 20, 30), task("5")).unwrap();
        timeline.add(ts(25, 20, 30), ts(25, 20, 40), task("6")).unwrap();
        timeline.add(ts(26, 20, 30), ts(26, 20, 40), task("7")).unwrap();
        timeline.add(ts(26, 10, 30), ts(26, 10, 40), task("8")).unwrap();
        timeline
    }

    fn slack_total(timeline: &Timeline) -> Duration {
        timeline
            .slots()
            .filter(|s| s.occupant.is_some_and(Occupant::is_slack))
            .filter_map(|s| s.duration())
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    #[test]
    fn opening_in_open_future_keeps_slack() {
        let (opening, slack) = sample().find_opening(ts(25, 20, 0) + Duration::days(28), Duration::days(2), Duration::zero());
        assert_eq!(slack, Duration::zero());
        assert_eq!(opening.end, None);
        assert_eq!(opening.begin, Some(ts(26, 20, 40)));
    }

    #[test]
    fn opening_in_open_past_collects_short_gaps() {
        let (opening, slack) = sample().find_opening(ts(28, 20, 0), Duration::days(2), Duration::zero());
        assert!(slack > Duration::zero());
        assert_eq!(opening.begin, None);
        assert_eq!(opening.end, Some(ts(25, 20, 0)));
        // 25 20:40 .. 26 10:30 and 26 10:40 .. 26 20:30
        assert_eq!(slack, Duration::minutes(13 * 60 + 50) + Duration::minutes(9 * 60 + 50));
    }

    #[test]
    fn opening_of_exact_length_is_accepted() {
        let (opening, slack) = sample().find_opening(ts(26, 10, 30), Duration::minutes(13 * 60 + 50), Duration::zero());
        assert_eq!(opening.begin, Some(ts(25, 20, 40)));
        assert_eq!(opening.end, Some(ts(26, 10, 30)));
        assert_eq!(slack, Duration::zero());
    }

    #[test]
    fn empty_timeline_opening_has_no_end() {
        let balance = Duration::hours(3);
        let (opening, slack) = Timeline::new().find_opening(ts(25, 12, 0), Duration::hours(1), balance);
        assert_eq!(opening.end, None);
        assert_eq!(slack, balance);
        assert!(opening.is_unbounded());
    }

    #[test]
    fn pad_slack_splits_a_free_slot() {
        let mut timeline = sample();
        timeline.pad_slack(ts(26, 12, 45), Duration::hours(1)).unwrap();
        let slot = timeline.get(ts(26, 12, 0));
        assert_eq!(slot.begin, Some(ts(26, 11, 45)));
        assert_eq!(slot.end, Some(ts(26, 12, 45)));
        assert!(slot.occupant.is_some_and(Occupant::is_slack));
        assert_eq!(slack_total(&timeline), Duration::hours(1));
        timeline.validate().unwrap();
    }

    #[test]
    fn pad_slack_overflows_before_first_boundary() {
        let mut timeline = sample();
        let count = timeline.count();
        timeline.pad_slack(ts(26, 22, 45), Duration::days(2)).unwrap();
        assert_eq!(slack_total(&timeline), Duration::days(2));
        assert_eq!(timeline.count(), count);
        assert!(timeline.boundaries()[0].begin < ts(25, 20, 0));
        timeline.validate().unwrap();
    }

    #[test]
    fn pad_slack_on_empty_timeline() {
        let mut timeline = Timeline::new();
        timeline.pad_slack(ts(25, 12, 0), Duration::hours(2)).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.boundaries()[0].begin, ts(25, 10, 0));
        assert_eq!(slack_total(&timeline), Duration::hours(2));
    }

    #[test]
    fn pad_slack_past_the_calendar_range_is_an_error() {
        let mut timeline = Timeline::new();
        let err = timeline
            .pad_slack(ts(25, 12, 0), Duration::days(200_000_000))
            .unwrap_err();
        assert!(matches!(err, TimelineError::OutOfRange { .. }));
        assert!(timeline.is_empty());
    }
}
