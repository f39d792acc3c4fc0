//! Graph construction and closure
//!
//! Builds the bidirectional graph of one scope's facts, then derives edges
//! until nothing changes:
//!
//! ```text
//! a ≡ b, a.f exists          ⇒  a.f ≡ b.f
//! a ← b, a[i] exists         ⇒  a[i] ← b[i]      (equal array dimensions only)
//! a ← b, a.§m exists         ⇒  a.§m ≡ b.§m
//! complete component sets    ⇒  see `SliceCompletion`
//! ```
//!
//! Exceeding `max_closure_iterations` is an engine defect, reported as an
//! invariant violation rather than a truncated graph.

use super::link_graph::{LinkGraph, VertexId};
use super::slice::SliceCompletion;
use crate::config::LinkConfig;
use crate::errors::{LinkError, Result};
use crate::features::linkage::domain::{Link, LinkNature, LinkedVariables};
use crate::features::linkage::ports::HiddenContentProvider;
use crate::shared::models::{MethodRef, Variable, VariableKind, VirtualKind};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

pub struct GraphBuilder<'a> {
    provider: &'a dyn HiddenContentProvider,
    config: &'a LinkConfig,
    method: &'a MethodRef,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        provider: &'a dyn HiddenContentProvider,
        config: &'a LinkConfig,
        method: &'a MethodRef,
    ) -> Self {
        Self {
            provider,
            config,
            method,
        }
    }

    /// Closed graph of `facts`; every variable in `modified` gets its mutation marker
    pub fn make_graph(
        &self,
        facts: &LinkedVariables,
        modified: &BTreeMap<Variable, BTreeSet<MethodRef>>,
    ) -> Result<LinkGraph> {
        let mut graph = LinkGraph::new();
        for links in facts.values() {
            for link in links {
                graph.add_link(link);
            }
        }
        for v in modified.keys() {
            if let Some(m) = self.provider.mutation_field(v.ty()) {
                graph.add_containment(&Variable::field(m, Some(v.clone())));
            }
        }
        let iterations = self.close(&mut graph)?;
        debug!(
            "closure of {} converged after {} iteration(s): {} vertices, {} edges",
            self.method,
            iterations,
            graph.vertex_count(),
            graph.edge_count()
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!("graph of {}:\n{}", self.method, graph.dump());
        }
        Ok(graph)
    }

    /// Derive edges until a pass adds nothing; returns the number of passes
    pub fn close(&self, graph: &mut LinkGraph) -> Result<usize> {
        let bound = self.config.max_closure_iterations.max(1);
        for iteration in 1..=bound {
            let mut derived = self.derive_sub_links(graph);
            derived.extend(SliceCompletion::complete(graph));
            let mut changed = false;
            for link in &derived {
                changed |= graph.add_link(link);
            }
            if !changed {
                return Ok(iteration);
            }
        }
        Err(LinkError::invariant(
            self.method,
            "closure-bound",
            format!("closure did not converge within {} iterations", bound),
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sub-variable propagation
    // ═══════════════════════════════════════════════════════════════════════

    fn derive_sub_links(&self, graph: &LinkGraph) -> Vec<Link> {
        let subs = direct_subs(graph);
        let mut result = Vec::new();
        for u in graph.vertices() {
            let Some(u_subs) = subs.get(&u) else {
                continue;
            };
            let from = graph.variable(u);
            let mut targets: Vec<(&VertexId, &LinkNature)> = graph
                .edges_of(u)
                .iter()
                .filter(|(_, n)| n.is_identical_or_assigned())
                .collect();
            targets.sort_by_key(|(v, _)| **v);
            for (v, nature) in targets {
                let to = graph.variable(*v);
                if !propagates_into(to) {
                    continue;
                }
                for s in u_subs {
                    let sub = graph.variable(*s);
                    let Some(counterpart) = self.counterpart(sub, from, to) else {
                        continue;
                    };
                    let n = if sub.is_mutation_marker() {
                        LinkNature::IS_IDENTICAL_TO
                    } else {
                        nature.clone()
                    };
                    result.push(Link::new(sub, n, &counterpart));
                }
            }
        }
        result
    }

    /// `sub` with its scope `from` replaced by `to`, when `to` has such a part
    fn counterpart(&self, sub: &Variable, from: &Variable, to: &Variable) -> Option<Variable> {
        let counterpart = match sub.kind() {
            VariableKind::Field {
                field,
                scope: Some(_),
            } => {
                let field = match field.virtual_kind {
                    Some(VirtualKind::Mutation) => self.provider.mutation_field(to.ty())?,
                    Some(VirtualKind::HiddenContent) => {
                        self.provider.hidden_content(to.ty())?;
                        self.provider.retarget(field, to.ty())
                    }
                    Some(VirtualKind::Component(i)) => {
                        self.provider.components(to.ty()).get(i as usize)?.clone()
                    }
                    None => {
                        // a ≡ a.next must not grow a.next.next...
                        if to.fields_in_chain().iter().any(|f| f == field) {
                            return None;
                        }
                        field.clone()
                    }
                };
                Some(Variable::field(field, Some(to.clone())))
            }
            VariableKind::Element { index, .. } => {
                if !index.is_slice() && from.ty().arrays != to.ty().arrays {
                    return None;
                }
                if to.ty().arrays == 0 && to.ty().tuple_components().is_none() {
                    return None;
                }
                Some(Variable::element(to.clone(), index.clone()))
            }
            _ => None,
        };
        counterpart.filter(|c| c.canonical_key() != sub.canonical_key())
    }
}

/// Sub-variables of every vertex that is the scope of another vertex
fn direct_subs(graph: &LinkGraph) -> FxHashMap<VertexId, Vec<VertexId>> {
    let mut subs: FxHashMap<VertexId, Vec<VertexId>> = FxHashMap::default();
    for v in graph.vertices() {
        let Some(scope) = graph.variable(v).scope() else {
            continue;
        };
        if let Some(s) = graph.vertex_of(scope) {
            subs.entry(s).or_default().push(v);
        }
    }
    subs
}

/// Identity with a marker, a functional value or a virtual field does not
/// carry sub-structure over
fn propagates_into(to: &Variable) -> bool {
    !(to.is_virtual_field() || to.is_marker() || to.is_functional())
}
