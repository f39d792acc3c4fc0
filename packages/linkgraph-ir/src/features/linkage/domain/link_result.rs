//! Result of evaluating one expression

use super::link::{merge_links, Link, Links, LinkedVariables};
use crate::shared::models::{MethodRef, Variable};
use std::collections::{BTreeMap, BTreeSet};

/// A call whose object-side effect needs the statement's snapshot to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub method: MethodRef,
    pub object: Variable,
}

#[derive(Debug, Clone)]
pub struct LinkResult {
    /// Links of the value the expression evaluates to; the primary stands for that value
    pub links: Links,
    /// Links discovered for other variables touched in passing
    pub extra: LinkedVariables,
    /// Modified variables, with the methods that caused it
    pub modified: BTreeMap<Variable, BTreeSet<MethodRef>>,
    pub pending: Vec<PendingCall>,
    /// Variables whose value was replaced: their previous links no longer hold
    pub erase: BTreeSet<Variable>,
}

impl LinkResult {
    pub fn of(value: &Variable) -> Self {
        Self::with_links(Links::new(value))
    }

    pub fn with_links(links: Links) -> Self {
        Self {
            links,
            extra: LinkedVariables::new(),
            modified: BTreeMap::new(),
            pending: Vec::new(),
            erase: BTreeSet::new(),
        }
    }

    pub fn primary(&self) -> &Variable {
        self.links.primary()
    }

    /// Combine the side effects of `other` into `self`; the primary links of `self` are kept
    pub fn merge(mut self, other: LinkResult) -> Self {
        self.absorb(other);
        self
    }

    /// Side effects of `other`, its primary links included as extra
    pub fn absorb(&mut self, other: LinkResult) {
        if !other.links.is_empty() {
            merge_links(&mut self.extra, &other.links);
        }
        for links in other.extra.values() {
            merge_links(&mut self.extra, links);
        }
        for (v, causes) in other.modified {
            self.modified.entry(v).or_default().extend(causes);
        }
        self.pending.extend(other.pending);
        self.erase.extend(other.erase);
    }

    pub fn add_extra(&mut self, link: Link) {
        super::link::add_link(&mut self.extra, link);
    }

    pub fn add_extra_links(&mut self, links: &Links) {
        if !links.is_empty() {
            merge_links(&mut self.extra, links);
        }
    }

    pub fn mark_modified(&mut self, v: &Variable, cause: Option<&MethodRef>) {
        let causes = self.modified.entry(v.clone()).or_default();
        if let Some(m) = cause {
            causes.insert(m.clone());
        }
    }
}
