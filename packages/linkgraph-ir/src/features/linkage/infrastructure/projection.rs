//! Projection: the public `Links` of one primary in a closed graph
//!
//! # Algorithm
//!
//! 1. Sources: every vertex that is the primary or part of it
//! 2. From each source, `compute_path_labels`; per target keep the best label
//! 3. Drop intra-object targets (except identities between mutation markers)
//! 4. Sort by rank, sub-variable targets before primary targets, then by name
//! 5. Insert in order; every insertion blocks its reverse and the coarser
//!    facts it implies on the enclosing scopes of either side
//!
//! The closed graph deliberately holds many derivations of the same fact; the
//! sort order and blocking rules decide which single fact is reported.

use super::fixpoint::{compute_path_labels, SelfLoop};
use super::link_graph::{LinkGraph, VertexId};
use crate::config::LinkConfig;
use crate::errors::{LinkError, Result};
use crate::features::linkage::domain::{Link, LinkNature, Links};
use crate::features::linkage::ports::HiddenContentProvider;
use crate::shared::models::{Variable, VariableKind};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;

struct Candidate {
    from: VertexId,
    nature: LinkNature,
    to: VertexId,
    to_is_primary: bool,
    to_name: String,
    from_name: String,
}

/// Public `Links` of `primary`; empty when the primary is not in the graph
pub fn follow_graph(
    graph: &LinkGraph,
    primary: &Variable,
    provider: &dyn HiddenContentProvider,
    config: &LinkConfig,
) -> Result<Links> {
    let sources = sources(graph, primary);
    let mut candidates = Vec::new();
    for from in &sources {
        let labels = compute_path_labels(
            |v: VertexId| Some(graph.edges_of(v)),
            *from,
            LinkNature::EMPTY,
            |a, b| a.combine(b),
        )
        .map_err(|SelfLoop(v)| {
            LinkError::invariant(
                primary,
                "no-self-loop",
                format!("vertex {} has an edge to itself", graph.variable(v)),
            )
        })?;

        let mut targets: Vec<(&VertexId, _)> = labels.iter().collect();
        targets.sort_by_key(|(v, _)| **v);
        for (to, set) in targets {
            if to == from {
                continue;
            }
            let Some(nature) = pick_best(set.iter()) else {
                continue;
            };
            let (fv, tv) = (graph.variable(*from), graph.variable(*to));
            if tv.is_canonical_part_of(primary) && !keeps_internal(&nature, fv, tv) {
                continue;
            }
            candidates.push(Candidate {
                from: *from,
                nature,
                to: *to,
                to_is_primary: tv.primary().canonical_key() == tv.canonical_key(),
                to_name: tv.to_string(),
                from_name: fv.to_string(),
            });
        }
    }
    candidates.sort_by(compare_candidates);

    let mut blocked: FxHashSet<(VertexId, LinkNature, VertexId)> = FxHashSet::default();
    let mut result = Links::new(primary);
    for c in candidates {
        if blocked.contains(&(c.from, c.nature.clone(), c.to)) {
            continue;
        }
        let from = rebase(graph.variable(c.from), primary);
        let to = graph.variable(c.to);
        result.push(Link::new(&from, c.nature.clone(), to));
        block(graph, &mut blocked, c.from, &c.nature, c.to);
    }

    if !primary.is_return() {
        add_mutation_equivalence(&mut result, provider);
    }
    if config.check_duplicate_primaries {
        check_links(&result)?;
    }
    Ok(result)
}

/// Parts of `primary` present in the graph, sub-variables first
fn sources(graph: &LinkGraph, primary: &Variable) -> Vec<VertexId> {
    let mut subs: Vec<(String, VertexId)> = graph
        .vertices()
        .filter(|v| {
            let var = graph.variable(*v);
            var.canonical_key() != primary.canonical_key() && var.is_canonical_part_of(primary)
        })
        .map(|v| (graph.variable(v).key().to_string(), v))
        .collect();
    subs.sort();
    let mut result: Vec<VertexId> = subs.into_iter().map(|(_, v)| v).collect();
    if let Some(p) = graph.vertex_of(primary) {
        result.push(p);
    }
    result
}

/// Highest rank; ties by symbol, then unrestricted identities first
fn pick_best<'a>(labels: impl Iterator<Item = &'a LinkNature>) -> Option<LinkNature> {
    let mut valid: Vec<&LinkNature> = labels.filter(|n| n.valid()).collect();
    valid.sort_by(|a, b| {
        b.rank()
            .cmp(&a.rank())
            .then_with(|| a.symbol().cmp(b.symbol()))
            .then_with(|| a.pass_through().is_some().cmp(&b.pass_through().is_some()))
            .then_with(|| pass_through_len(b).cmp(&pass_through_len(a)))
    });
    valid.first().map(|n| (*n).clone())
}

fn pass_through_len(n: &LinkNature) -> usize {
    n.pass_through().map_or(0, |p| p.len())
}

/// Intra-object links survive only as identities between mutation markers
fn keeps_internal(nature: &LinkNature, from: &Variable, to: &Variable) -> bool {
    nature.is_identical() && (from.is_mutation_marker() || to.is_mutation_marker())
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.nature
        .rank()
        .cmp(&a.nature.rank())
        .then_with(|| a.to_is_primary.cmp(&b.to_is_primary))
        .then_with(|| a.to_name.cmp(&b.to_name))
        .then_with(|| a.from_name.cmp(&b.from_name))
        .then_with(|| a.nature.symbol().cmp(b.nature.symbol()))
}

/// `v` with the part canonically equal to `primary` replaced by `primary` itself
fn rebase(v: &Variable, primary: &Variable) -> Variable {
    v.map_parts(&mut |p| (p.canonical_key() == primary.canonical_key()).then(|| primary.clone()))
}

// ═══════════════════════════════════════════════════════════════════════════
// Redundancy blocking
// ═══════════════════════════════════════════════════════════════════════════

/// Enclosing scopes reachable by field (or slice) steps, nearest first
fn field_ancestors(graph: &LinkGraph, v: VertexId) -> Vec<VertexId> {
    let mut result = Vec::new();
    let mut current = graph.variable(v).clone();
    loop {
        let step_is_field = match current.kind() {
            VariableKind::Field { scope: Some(_), .. } => true,
            VariableKind::Element { index, .. } => index.is_slice(),
            _ => false,
        };
        if !step_is_field {
            break;
        }
        let Some(scope) = current.scope().cloned() else {
            break;
        };
        let Some(id) = graph.vertex_of(&scope) else {
            break;
        };
        result.push(id);
        current = scope;
    }
    result
}

fn block(
    graph: &LinkGraph,
    blocked: &mut FxHashSet<(VertexId, LinkNature, VertexId)>,
    from: VertexId,
    nature: &LinkNature,
    to: VertexId,
) {
    blocked.insert((to, nature.reverse(), from));

    let from_up = field_ancestors(graph, from);
    let to_up = field_ancestors(graph, to);

    // `up` composes ≻ once per level climbed on the source side, `down` ≺ on the target side
    let mut up = LinkNature::CONTAINS_AS_FIELD;
    for s in &from_up {
        for n in nature.redundant_from_up(&up) {
            blocked.insert((*s, n, to));
        }
        let mut down = LinkNature::IS_FIELD_OF;
        for t in &to_up {
            for n in nature.redundant_up(&up, &down) {
                blocked.insert((*s, n, *t));
            }
            down = down.combine(&LinkNature::IS_FIELD_OF);
        }
        up = LinkNature::CONTAINS_AS_FIELD.combine(&up);
    }
    let mut down = LinkNature::IS_FIELD_OF;
    for t in &to_up {
        for n in nature.redundant_to_up(&down) {
            blocked.insert((from, n, *t));
        }
        down = down.combine(&LinkNature::IS_FIELD_OF);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Post-processing
// ═══════════════════════════════════════════════════════════════════════════

/// `f ≡ t` (or `←`, `→`) between two mutable non-virtual variables also
/// means their mutation markers are identical
fn add_mutation_equivalence(links: &mut Links, provider: &dyn HiddenContentProvider) {
    let mut extra = Vec::new();
    for link in links.iter() {
        if !link.nature.is_identical_or_assigned()
            || link.from.is_virtual_field()
            || link.to.is_virtual_field()
            || link.to.is_marker()
        {
            continue;
        }
        let (Some(fm), Some(tm)) = (
            provider.mutation_field(link.from.ty()),
            provider.mutation_field(link.to.ty()),
        ) else {
            continue;
        };
        extra.push(Link::new(
            &Variable::field(fm, Some(link.from.clone())),
            LinkNature::IS_IDENTICAL_TO,
            &Variable::field(tm, Some(link.to.clone())),
        ));
    }
    for link in extra {
        links.push(link);
    }
}

fn check_links(links: &Links) -> Result<()> {
    let mut seen = FxHashSet::default();
    for link in links {
        if !link.from.is_part_of(links.primary()) {
            return Err(LinkError::invariant(
                links.primary(),
                "links-primary",
                format!("{} is not part of {}", link.from, links.primary()),
            ));
        }
        if !seen.insert((link.from.key(), link.to.key())) {
            return Err(LinkError::invariant(
                links.primary(),
                "unique-link",
                format!("{} → {} recorded twice", link.from, link.to),
            ));
        }
    }
    Ok(())
}
