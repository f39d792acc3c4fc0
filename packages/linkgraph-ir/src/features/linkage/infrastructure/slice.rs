//! Slice completion
//!
//! Keyed containers expose each tuple component through a slice of their
//! hidden content: `m.§kvs[-1]` holds the keys, `m.§kvs[-2]` the values.
//! When every component of an entry is known to sit in the matching slice of
//! the same container, the entry as a whole is an element of it:
//!
//! ```text
//! e.§k ∈ m.§kvs[-1], e.§v ∈ m.§kvs[-2]      ⇒  e ∈ m.§kvs
//! a.§kvs[-1] ~ b.§kvs[-1], a.§kvs[-2] ~ b.§kvs[-2]  ⇒  a.§kvs ~ b.§kvs
//! ```

use super::link_graph::LinkGraph;
use crate::features::linkage::domain::{Link, LinkKind, LinkNature};
use crate::shared::models::{Index, Variable, VariableKind, VirtualKind};
use rustc_hash::{FxHashMap, FxHashSet};

pub struct SliceCompletion;

impl SliceCompletion {
    /// Links implied by complete sets of component or slice links
    pub fn complete(graph: &LinkGraph) -> Vec<Link> {
        let mut result = Self::complete_entries(graph);
        result.extend(Self::complete_slices(graph));
        result
    }

    fn complete_entries(graph: &LinkGraph) -> Vec<Link> {
        // (entry, container) → components seen
        let mut seen: FxHashMap<(String, String), (Variable, Variable, FxHashSet<usize>)> =
            FxHashMap::default();
        for from in graph.vertices() {
            let component_var = graph.variable(from);
            let Some((entry, component)) = component_of(component_var) else {
                continue;
            };
            for (to, nature) in graph.edges_of(from) {
                if nature.kind() != LinkKind::IsElementOf {
                    continue;
                }
                let Some((container, slice)) = slice_of(graph.variable(*to)) else {
                    continue;
                };
                if slice != component {
                    continue;
                }
                let key = (
                    entry.canonical_key().to_string(),
                    container.canonical_key().to_string(),
                );
                seen.entry(key)
                    .or_insert_with(|| (entry.clone(), container.clone(), FxHashSet::default()))
                    .2
                    .insert(component);
            }
        }
        let mut result: Vec<Link> = seen
            .into_values()
            .filter(|(entry, _, components)| {
                let expected = entry.ty().tuple_components().map_or(0, |c| c.len());
                expected > 0 && components.len() == expected
            })
            .map(|(entry, container, _)| Link::new(&entry, LinkNature::IS_ELEMENT_OF, &container))
            .collect();
        result.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        result
    }

    fn complete_slices(graph: &LinkGraph) -> Vec<Link> {
        let mut seen: FxHashMap<(String, String), (Variable, Variable, FxHashSet<usize>)> =
            FxHashMap::default();
        for from in graph.vertices() {
            let Some((a, ka)) = slice_of(graph.variable(from)) else {
                continue;
            };
            for (to, nature) in graph.edges_of(from) {
                if !matches!(
                    nature.kind(),
                    LinkKind::SharesElements | LinkKind::IsIdenticalTo
                ) {
                    continue;
                }
                let Some((b, kb)) = slice_of(graph.variable(*to)) else {
                    continue;
                };
                if ka != kb || a.canonical_key() == b.canonical_key() {
                    continue;
                }
                let key = (a.canonical_key().to_string(), b.canonical_key().to_string());
                seen.entry(key)
                    .or_insert_with(|| (a.clone(), b.clone(), FxHashSet::default()))
                    .2
                    .insert(ka);
            }
        }
        let mut result: Vec<Link> = seen
            .into_values()
            .filter(|(a, _, components)| {
                let expected = a.ty().tuple_components().map_or(0, |c| c.len());
                expected > 0 && components.len() == expected
            })
            .map(|(a, b, _)| Link::new(&a, LinkNature::SHARES_ELEMENTS, &b))
            .collect();
        result.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        result
    }
}

/// `e.§c` with component index, as (e, index)
fn component_of(v: &Variable) -> Option<(Variable, usize)> {
    match v.kind() {
        VariableKind::Field {
            field,
            scope: Some(scope),
        } => match field.virtual_kind {
            Some(VirtualKind::Component(i)) => Some((scope.clone(), i as usize)),
            _ => None,
        },
        _ => None,
    }
}

/// `c[-k]` with component index, as (c, k - 1)
fn slice_of(v: &Variable) -> Option<(Variable, usize)> {
    match v.kind() {
        VariableKind::Element {
            array,
            index: index @ Index::Constant(_),
        } => index.slice_component().map(|c| (array.clone(), c)),
        _ => None,
    }
}
