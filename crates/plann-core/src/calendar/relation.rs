//! Relation graph over calendar objects.
//!
//! Design:
//! - Forward edges: uid -> RELATED-TO links the object itself declares
//! - Reverse edges: uid -> uids of objects that point at it
//! - Invariant: edges and reverse_edges are kept in sync
//!
//! Links are nominally bidirectional (a PARENT link should be answered by
//! a CHILD-like link back), but calendar data edited by other clients
//! often is not. The graph reports those inconsistencies; it never
//! repairs them.

use std::collections::{BTreeMap, BTreeSet};

use super::object::{CalendarObject, Relation, RelationClass, RelationType};
use crate::error::{InconsistentRelation, RelationView};

/// Bidirectional index of RELATED-TO links.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    /// Forward edges: uid -> links it declares
    edges: BTreeMap<String, Vec<Relation>>,

    /// Reverse edges: uid -> uids declaring a link to it
    reverse_edges: BTreeMap<String, BTreeSet<String>>,

    /// Every object the graph was built from, linked or not
    known: BTreeSet<String>,
}

impl RelationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every link of every object.
    pub fn from_objects<'a>(objects: impl IntoIterator<Item = &'a CalendarObject>) -> Self {
        let mut graph = Self::new();
        for object in objects {
            graph.insert_object(object.uid(), object.relations());
        }
        graph
    }

    /// Register an object and all links it declares.
    pub fn insert_object(&mut self, uid: &str, relations: &[Relation]) {
        self.known.insert(uid.to_string());
        for rel in relations {
            self.add_link(uid, rel.reltype, &rel.uid);
        }
    }

    /// Add a link `from -[reltype]-> to`, keeping both edge maps in sync.
    pub fn add_link(&mut self, from: &str, reltype: RelationType, to: &str) {
        let links = self.edges.entry(from.to_string()).or_default();
        let rel = Relation::new(reltype, to);
        if !links.contains(&rel) {
            links.push(rel);
        }
        self.reverse_edges
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }

    /// Drop every link `from` declares towards `to`.
    pub fn remove_links(&mut self, from: &str, to: &str) {
        if let Some(links) = self.edges.get_mut(from) {
            links.retain(|rel| rel.uid != to);
            if links.is_empty() {
                self.edges.remove(from);
            }
        }
        if let Some(referrers) = self.reverse_edges.get_mut(to) {
            referrers.remove(from);
            if referrers.is_empty() {
                self.reverse_edges.remove(to);
            }
        }
    }

    /// Links declared by `uid`.
    pub fn links(&self, uid: &str) -> &[Relation] {
        self.edges.get(uid).map(Vec::as_slice).unwrap_or_default()
    }

    /// Uids of objects declaring a link to `uid`.
    pub fn referrers(&self, uid: &str) -> Vec<&str> {
        self.reverse_edges
            .get(uid)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Relation types `from` declares towards `to`.
    pub fn reltypes_between(&self, from: &str, to: &str) -> Vec<RelationType> {
        self.links(from)
            .iter()
            .filter(|rel| rel.uid == to)
            .map(|rel| rel.reltype)
            .collect()
    }

    /// Check that the link(s) `from -> to` are answered by exactly one
    /// back link of the inverse class.
    pub fn check_link(&self, from: &str, to: &str) -> Result<(), InconsistentRelation> {
        let forward = self.reltypes_between(from, to);
        let back = self.reltypes_between(to, from);
        let views = || {
            (
                RelationView {
                    uid: from.to_string(),
                    reltypes: forward.clone(),
                },
                RelationView {
                    uid: to.to_string(),
                    reltypes: back.clone(),
                },
            )
        };

        if back.is_empty() {
            let (from, to) = views();
            return Err(InconsistentRelation::MissingBackLink { from, to });
        }
        if back.len() > 1 {
            let (from, to) = views();
            return Err(InconsistentRelation::MultipleBackLinks { from, to });
        }
        let expected = forward.iter().map(|rt| rt.class().inverse()).collect::<BTreeSet<_>>();
        if expected.len() != 1 || !expected.contains(&back[0].class()) {
            let (from, to) = views();
            return Err(InconsistentRelation::MismatchedBackLink { from, to });
        }
        Ok(())
    }

    /// Relatives of `uid` in `class`, verifying each back link.
    pub fn relatives(&self, uid: &str, class: RelationClass) -> Result<Vec<String>, InconsistentRelation> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for rel in self.links(uid) {
            if rel.reltype.class() != class || !seen.insert(rel.uid.as_str()) {
                continue;
            }
            self.check_link(uid, &rel.uid)?;
            out.push(rel.uid.clone());
        }
        Ok(out)
    }

    /// Every inconsistency in the graph, each pair reported once.
    pub fn validate(&self) -> Vec<InconsistentRelation> {
        let mut checked = BTreeSet::new();
        let mut problems = Vec::new();
        for (from, links) in &self.edges {
            for rel in links {
                let pair = ordered_pair(from, &rel.uid);
                if !checked.insert(pair) {
                    continue;
                }
                if let Err(problem) = self.check_link(from, &rel.uid) {
                    problems.push(problem);
                }
            }
        }
        problems
    }

    /// Links pointing at uids the graph has never seen.
    pub fn dangling(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .flat_map(|(from, links)| links.iter().map(move |rel| (from.as_str(), rel.uid.as_str())))
            .filter(|(_, to)| !self.known.contains(*to))
            .collect()
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
