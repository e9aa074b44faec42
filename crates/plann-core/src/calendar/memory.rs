//! In-memory calendar backed by a plain list of objects.
//!
//! Used by the CLI on top of a JSON snapshot and by tests. Mutations made
//! through `set_due` stay pending until `save` is called for the object.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::object::{
    CalendarEvent, CalendarObject, CalendarTask, Relation, RelationClass, RelationType,
};
use super::relation::RelationGraph;
use super::store::{CalendarStore, DependencyCheck, SearchQuery};
use crate::error::StoreError;
use crate::timespec::{DateOrTime, TimeZonePolicy};

/// A calendar held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCalendar {
    objects: Vec<CalendarObject>,
    graph: RelationGraph,
    tz: TimeZonePolicy,
    pending: BTreeSet<String>,
    saved: Vec<String>,
}

impl InMemoryCalendar {
    /// Create an empty calendar
    pub fn new(tz: TimeZonePolicy) -> Self {
        Self {
            tz,
            ..Self::default()
        }
    }

    /// Create a calendar holding `objects`
    pub fn with_objects(objects: Vec<CalendarObject>, tz: TimeZonePolicy) -> Self {
        let graph = RelationGraph::from_objects(&objects);
        Self {
            objects,
            graph,
            tz,
            ..Self::default()
        }
    }

    /// Add or replace an object by uid.
    pub fn insert(&mut self, object: impl Into<CalendarObject>) {
        let object = object.into();
        if let Some(existing) = self.objects.iter_mut().find(|o| o.uid() == object.uid()) {
            *existing = object;
            self.graph = RelationGraph::from_objects(&self.objects);
        } else {
            self.graph.insert_object(object.uid(), object.relations());
            self.objects.push(object);
        }
    }

    pub fn objects(&self) -> &[CalendarObject] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<CalendarObject> {
        self.objects
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    pub fn tz(&self) -> &TimeZonePolicy {
        &self.tz
    }

    /// Uids passed to `save`, in call order.
    pub fn saved(&self) -> &[String] {
        &self.saved
    }

    /// Whether `uid` has changes that were never saved.
    pub fn has_pending(&self, uid: &str) -> bool {
        self.pending.contains(uid)
    }

    fn task_mut(&mut self, uid: &str) -> Option<&mut CalendarTask> {
        self.objects.iter_mut().find_map(|o| match o {
            CalendarObject::Task(task) if task.uid == uid => Some(task),
            _ => None,
        })
    }

    fn find_task(&self, uid: &str) -> Option<&CalendarTask> {
        self.objects
            .iter()
            .filter_map(CalendarObject::as_task)
            .find(|task| task.uid == uid)
    }

    /// Answer PARENT links from `child` with CHILD links on each parent task.
    fn link_back(&mut self, child: &str, parents: Vec<String>) {
        for parent in parents {
            let Some(task) = self.task_mut(&parent) else {
                warn!(child, parent = %parent, "object names an unknown parent");
                continue;
            };
            let back = Relation::new(RelationType::Child, child);
            if !task.relations.contains(&back) {
                task.relations.push(back);
                self.graph.add_link(&parent, RelationType::Child, child);
                self.saved.push(parent);
            }
        }
    }

    fn matches(&self, object: &CalendarObject, query: &SearchQuery) -> bool {
        match object {
            CalendarObject::Task(task) => {
                if !query.kinds.todo || (!query.include_completed && task.status.is_closed()) {
                    return false;
                }
                let begin = task.dtstart.or(task.due).map(|v| self.tz.ensure_ts(v));
                let end = task.due_ts(&self.tz);
                query.overlaps(begin, end)
            }
            CalendarObject::Event(event) => {
                if !query.kinds.event {
                    return false;
                }
                match event.span(&self.tz) {
                    Some((begin, end)) => query.overlaps(Some(begin), Some(end)),
                    None => {
                        let begin = event.dtstart.map(|v| self.tz.ensure_ts(v));
                        query.overlaps(begin, None)
                    }
                }
            }
        }
    }
}

impl CalendarStore for InMemoryCalendar {
    fn search(&self, query: &SearchQuery) -> Result<Vec<CalendarObject>, StoreError> {
        Ok(self
            .objects
            .iter()
            .filter(|o| self.matches(o, query))
            .cloned()
            .collect())
    }

    fn task(&self, uid: &str) -> Result<Option<CalendarTask>, StoreError> {
        Ok(self.find_task(uid).cloned())
    }

    fn relatives(&self, uid: &str, class: RelationClass) -> Result<Vec<CalendarTask>, StoreError> {
        let uids = self.graph.relatives(uid, class)?;
        Ok(uids
            .iter()
            .filter_map(|related| self.find_task(related))
            .cloned()
            .collect())
    }

    fn set_due(
        &mut self,
        uid: &str,
        due: DateOrTime,
        move_dtstart: bool,
        check: DependencyCheck,
    ) -> Result<Option<CalendarTask>, StoreError> {
        if self.find_task(uid).is_none() {
            return Err(StoreError::NotFound(uid.to_string()));
        }

        if check == DependencyCheck::Return {
            let new_due = self.tz.ensure_ts(due);
            for parent in self.relatives(uid, RelationClass::ParentLike)? {
                if parent.status.is_closed() {
                    continue;
                }
                if let Some(parent_due) = parent.due_ts(&self.tz) {
                    if parent_due < new_due {
                        debug!(uid, parent = %parent.uid, "due blocked by parent");
                        return Ok(Some(parent));
                    }
                }
            }
        }

        let tz = self.tz;
        let stored = tz.for_storage(due);
        if let Some(task) = self.task_mut(uid) {
            task.move_due(stored, move_dtstart, &tz);
        }
        self.pending.insert(uid.to_string());
        Ok(None)
    }

    fn save(&mut self, uid: &str) -> Result<(), StoreError> {
        if !self.objects.iter().any(|o| o.uid() == uid) {
            return Err(StoreError::NotFound(uid.to_string()));
        }
        self.pending.remove(uid);
        self.saved.push(uid.to_string());
        Ok(())
    }

    /// Stores the event and answers each of its PARENT links with a CHILD
    /// link on the parent task.
    fn add_event(&mut self, event: CalendarEvent) -> Result<(), StoreError> {
        let parents: Vec<String> = event.parent_uids().map(str::to_string).collect();
        let event_uid = event.uid.clone();
        self.insert(event);
        self.saved.push(event_uid.clone());
        self.link_back(&event_uid, parents);
        Ok(())
    }

    /// Like `add_event`; the PARENT links of the task get CHILD links back.
    fn add_task(&mut self, task: CalendarTask) -> Result<(), StoreError> {
        let parents: Vec<String> = task
            .relations
            .iter()
            .filter(|rel| rel.reltype == RelationType::Parent)
            .map(|rel| rel.uid.clone())
            .collect();
        let task_uid = task.uid.clone();
        self.insert(task);
        self.saved.push(task_uid.clone());
        self.link_back(&task_uid, parents);
        Ok(())
    }

    fn update_task(&mut self, task: CalendarTask) -> Result<(), StoreError> {
        if self.find_task(&task.uid).is_none() {
            return Err(StoreError::NotFound(task.uid));
        }
        self.pending.insert(task.uid.clone());
        self.insert(task);
        Ok(())
    }

    /// Removes the object and every link other objects hold to it.
    fn delete(&mut self, uid: &str) -> Result<CalendarObject, StoreError> {
        let index = self
            .objects
            .iter()
            .position(|o| o.uid() == uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        let removed = self.objects.remove(index);
        self.pending.remove(uid);

        let mut touched = Vec::new();
        for object in &mut self.objects {
            let relations = match object {
                CalendarObject::Task(task) => &mut task.relations,
                CalendarObject::Event(event) => &mut event.relations,
            };
            let before = relations.len();
            relations.retain(|rel| rel.uid != uid);
            if relations.len() != before {
                touched.push(object.uid().to_string());
            }
        }
        self.graph = RelationGraph::from_objects(&self.objects);
        debug!(uid, unlinked = touched.len(), "object deleted");
        self.saved.push(uid.to_string());
        self.saved.extend(touched);
        Ok(removed)
    }
}
