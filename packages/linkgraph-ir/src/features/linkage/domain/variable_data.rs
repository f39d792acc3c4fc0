//! Per-statement snapshot of every known variable's links

use super::link::{Links, LinkedVariables};
use crate::shared::models::{MethodRef, Variable};
use std::collections::{BTreeMap, BTreeSet};

/// Variables linked to the object of one call site; `true` marks the object itself
pub type LinkedToObject = BTreeMap<Variable, bool>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableData {
    index: String,
    links: LinkedVariables,
    /// Variables modified by this statement, with the methods that caused it
    modified: BTreeMap<Variable, BTreeSet<MethodRef>>,
    /// Call sites of this statement, keyed `index#n`
    call_sites: BTreeMap<String, LinkedToObject>,
}

impl VariableData {
    pub fn new(index: &str) -> Self {
        Self {
            index: index.to_string(),
            ..Self::default()
        }
    }

    /// Same variables and links under a new statement index; per-statement data is reset
    pub fn successor(&self, index: &str) -> Self {
        Self {
            index: index.to_string(),
            links: self.links.clone(),
            modified: BTreeMap::new(),
            call_sites: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn get(&self, v: &Variable) -> Option<&Links> {
        self.links.get(v)
    }

    /// Links of `v`, empty when unknown
    pub fn links_of(&self, v: &Variable) -> Links {
        self.links.get(v).cloned().unwrap_or_else(|| Links::new(v))
    }

    pub fn contains(&self, v: &Variable) -> bool {
        self.links.contains_key(v)
    }

    pub fn insert(&mut self, links: Links) {
        self.links.insert(links.primary().clone(), links);
    }

    pub fn remove(&mut self, v: &Variable) -> Option<Links> {
        self.links.remove(v)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.links.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Links)> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn linked_variables(&self) -> &LinkedVariables {
        &self.links
    }

    pub fn modified(&self) -> &BTreeMap<Variable, BTreeSet<MethodRef>> {
        &self.modified
    }

    pub fn is_modified(&self, v: &Variable) -> bool {
        self.modified.contains_key(v)
    }

    pub fn mark_modified(&mut self, v: &Variable, causes: &BTreeSet<MethodRef>) {
        self.modified
            .entry(v.clone())
            .or_default()
            .extend(causes.iter().cloned());
    }

    pub fn record_call_site(&mut self, id: String, linked: LinkedToObject) {
        self.call_sites.insert(id, linked);
    }

    pub fn linked_to_object(&self, call_id: &str) -> Option<&LinkedToObject> {
        self.call_sites.get(call_id)
    }

    pub fn call_sites(&self) -> &BTreeMap<String, LinkedToObject> {
        &self.call_sites
    }

    /// Union with the snapshot of another branch: links of common variables are
    /// merged, variables only known in `other` are added.
    pub fn merge_branch(&mut self, other: &VariableData) {
        for (v, links) in &other.links {
            match self.links.get_mut(v) {
                Some(existing) => existing.merge(links),
                None => {
                    self.links.insert(v.clone(), links.clone());
                }
            }
        }
        self.absorb_effects(other);
    }

    /// Modifications and call sites of `other`, without its links
    pub fn absorb_effects(&mut self, other: &VariableData) {
        for (v, causes) in &other.modified {
            self.mark_modified(v, causes);
        }
        for (id, linked) in &other.call_sites {
            self.call_sites.insert(id.clone(), linked.clone());
        }
    }

    /// Drop every variable for which `keep` is false
    pub fn retain_variables(&mut self, mut keep: impl FnMut(&Variable) -> bool) {
        self.links.retain(|v, _| keep(v));
    }
}
