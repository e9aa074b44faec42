//! Postponing tasks across the relation graph.
//!
//! Moving one task may drag its parents, children or whole family along,
//! and a parent due earlier than the new due blocks the move. What happens
//! then is decided by [`PostponePolicy`]; questions go to a [`Decider`].

mod decider;
mod policy;

pub use decider::{Conflict, Decider, FixedDecider, Question};
pub use policy::{CheckDependent, Choice, Delay, PostponePolicy};

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarStore, CalendarTask, DependencyCheck, RelationClass};
use crate::error::{PostponeError, TimeSpecError};
use crate::timespec::{DateOrTime, TimeZonePolicy, Timestamp};

/// Recursion deeper than this is taken as a relation loop.
pub const MAX_DEPTH: usize = 16;

/// Parents with a priority number above this may be moved to make room.
const FLEXIBLE_PRIORITY: u8 = 2;

/// Runs postponement requests against a calendar.
pub struct Postponer<'a, S: CalendarStore + ?Sized, D: Decider + ?Sized> {
    store: &'a mut S,
    decider: &'a mut D,
    tz: TimeZonePolicy,
    now: Timestamp,
    postponed: HashSet<String>,
}

impl<'a, S: CalendarStore + ?Sized, D: Decider + ?Sized> Postponer<'a, S, D> {
    pub fn new(store: &'a mut S, decider: &'a mut D, tz: TimeZonePolicy) -> Self {
        Self {
            store,
            decider,
            now: tz.now(),
            tz,
            postponed: HashSet::new(),
        }
    }

    /// Fix "now" instead of reading the clock.
    pub fn with_now(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }

    /// Uids moved by the last [`procrastinate`](Self::procrastinate) call.
    pub fn postponed(&self) -> &HashSet<String> {
        &self.postponed
    }

    /// Postpone `uids` and whatever the policy drags along.
    ///
    /// Returns `Some(parent)` only under [`CheckDependent::Return`], when
    /// `parent` is due before a new due date; the blocked task is left
    /// untouched. Tasks already moved earlier in the same call are skipped.
    pub fn procrastinate(
        &mut self,
        uids: &[String],
        delay: &Delay,
        policy: &PostponePolicy,
    ) -> Result<Option<CalendarTask>, PostponeError> {
        self.postponed.clear();
        self.postpone_all(uids, delay, *policy, 0)
    }

    fn postpone_all(
        &mut self,
        uids: &[String],
        delay: &Delay,
        mut policy: PostponePolicy,
        depth: usize,
    ) -> Result<Option<CalendarTask>, PostponeError> {
        for uid in uids {
            if depth >= MAX_DEPTH {
                return Err(PostponeError::RelationshipCycleSuspected {
                    uid: uid.clone(),
                    depth,
                });
            }
            let Some(task) = self.store.task(uid)? else {
                warn!(uid = %uid, "no such task, skipping");
                continue;
            };
            if task.status.is_closed() {
                debug!(uid = %uid, status = task.status.as_str(), "closed task, skipping");
                continue;
            }
            if self.postponed.contains(uid) {
                debug!(uid = %uid, "already postponed in this run");
                continue;
            }

            self.settle_questions(&task, &mut policy);

            if policy.with_family.is_yes() {
                let parents = self.relative_uids(uid, RelationClass::ParentLike)?;
                let blocked = if parents.is_empty() {
                    // the top of the family: itself and everything below
                    self.postpone_all(
                        std::slice::from_ref(uid),
                        delay,
                        policy.downwards(),
                        depth + 1,
                    )?
                } else {
                    self.postpone_all(&parents, delay, policy, depth + 1)?
                };
                if blocked.is_some() {
                    return Ok(blocked);
                }
                continue;
            }

            if policy.with_parent.is_yes() {
                let parents = self.relative_uids(uid, RelationClass::ParentLike)?;
                if let Some(parent) =
                    self.postpone_all(&parents, delay, policy.downwards(), depth + 1)?
                {
                    return Ok(Some(parent));
                }
                if self.postponed.contains(uid) {
                    continue;
                }
            }

            let new_due = self.new_due(&task, delay)?;
            if let Some(parent) = self.move_one(&task, new_due, policy, depth)? {
                return Ok(Some(parent));
            }

            if policy.with_children.is_yes() {
                let children = self.relative_uids(uid, RelationClass::ChildLike)?;
                if let Some(parent) =
                    self.postpone_all(&children, delay, policy.downwards(), depth + 1)?
                {
                    return Ok(Some(parent));
                }
            }
        }
        Ok(None)
    }

    /// Turn every `Ask` that applies to this task into a yes or no.
    ///
    /// Answers stick for the rest of the current list. An `Ask` that does
    /// not apply stays unanswered and counts as no.
    fn settle_questions(&mut self, task: &CalendarTask, policy: &mut PostponePolicy) {
        if task.relations.is_empty() {
            return;
        }
        let label = task.label().to_string();
        if policy.with_family == Choice::Ask {
            policy.with_family = self
                .decider
                .resolve(&Question::Family { task: label.clone() })
                .into();
        }
        if policy.with_family.is_yes() {
            return;
        }
        if policy.with_parent == Choice::Ask
            && !task.related_uids(RelationClass::ParentLike).is_empty()
        {
            policy.with_parent = self
                .decider
                .resolve(&Question::Parents { task: label.clone() })
                .into();
        }
        if policy.with_children == Choice::Ask
            && !task.related_uids(RelationClass::ChildLike).is_empty()
        {
            policy.with_children = self
                .decider
                .resolve(&Question::Children { task: label })
                .into();
        }
    }

    fn new_due(&self, task: &CalendarTask, delay: &Delay) -> Result<DateOrTime, PostponeError> {
        match delay {
            Delay::Until(due) => Ok(*due),
            Delay::By(spec) => {
                let base = match task.due_ts(&self.tz) {
                    Some(due) if due > self.now => due,
                    _ => self.now,
                };
                Ok(spec.apply(DateOrTime::DateTime(base), &self.tz)?)
            }
        }
    }

    /// Move a single task, handling a blocking parent per the policy.
    fn move_one(
        &mut self,
        task: &CalendarTask,
        new_due: DateOrTime,
        policy: PostponePolicy,
        depth: usize,
    ) -> Result<Option<CalendarTask>, PostponeError> {
        let check = match policy.check_dependent {
            CheckDependent::Off => DependencyCheck::Off,
            _ => DependencyCheck::Return,
        };
        let Some(parent) = self.store.set_due(&task.uid, new_due, true, check)? else {
            self.store.save(&task.uid)?;
            info!(uid = %task.uid, summary = task.label(), due = %new_due, "postponed");
            self.postponed.insert(task.uid.clone());
            return Ok(None);
        };

        match policy.check_dependent {
            CheckDependent::Return => Ok(Some(parent)),
            CheckDependent::Error => {
                self.decider.report(&Conflict::new(task, &parent));
                Ok(None)
            }
            CheckDependent::Interactive => {
                self.decider.report(&Conflict::new(task, &parent));
                let flexible = parent.defined_priority().unwrap_or(9) > FLEXIBLE_PRIORITY;
                let question = Question::BlockingParent {
                    task: task.label().to_string(),
                    parent: parent.label().to_string(),
                };
                if !flexible || !self.decider.resolve(&question) {
                    return Ok(None);
                }

                let room = parent.get_duration(&self.tz).max(Duration::days(1));
                let parent_due = self
                    .tz
                    .ensure_ts(new_due)
                    .checked_add_signed(room)
                    .map(DateOrTime::DateTime)
                    .ok_or_else(|| TimeSpecError::Overflow(format!("{new_due} + {room}")))?;
                let alone = policy.alone();
                let parent_uid = std::slice::from_ref(&parent.uid);
                if let Some(blocker) =
                    self.postpone_all(parent_uid, &Delay::Until(parent_due), alone, depth + 1)?
                {
                    return Ok(Some(blocker));
                }
                if !self.made_room(&parent.uid, new_due)? {
                    debug!(uid = %task.uid, parent = %parent.uid, "parent stayed put, task not moved");
                    return Ok(None);
                }
                self.postpone_all(
                    std::slice::from_ref(&task.uid),
                    &Delay::Until(new_due),
                    alone,
                    depth + 1,
                )
            }
            CheckDependent::Off => Ok(None),
        }
    }

    /// Whether `parent` was moved in this run to at least `due`.
    fn made_room(&self, parent: &str, due: DateOrTime) -> Result<bool, PostponeError> {
        if !self.postponed.contains(parent) {
            return Ok(false);
        }
        let wanted = self.tz.ensure_ts(due);
        Ok(self
            .store
            .task(parent)?
            .and_then(|p| p.due_ts(&self.tz))
            .is_some_and(|moved| moved >= wanted))
    }

    fn relative_uids(&self, uid: &str, class: RelationClass) -> Result<Vec<String>, PostponeError> {
        Ok(self
            .store
            .relatives(uid, class)?
            .into_iter()
            .map(|task| task.uid)
            .collect())
    }
}
