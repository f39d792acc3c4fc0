//! Path-label propagation
//!
//! Computes, for every vertex reachable from a start vertex, the set of all
//! distinct labels accumulated along any path. The lattice is not a total
//! order, so every label is kept; choosing among them is up to the caller.
//!
//! Worklist in BFS order. A vertex is re-enqueued whenever it receives a label
//! it did not have; label sets only grow and are bounded by the finite
//! lattice, which guarantees termination.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;

/// A vertex with an edge to itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfLoop<V>(pub V);

pub fn compute_path_labels<'g, V, L, E, C>(
    edges: E,
    start: V,
    identity: L,
    combine: C,
) -> Result<FxHashMap<V, FxHashSet<L>>, SelfLoop<V>>
where
    V: Copy + Eq + Hash + 'g,
    L: Clone + Eq + Hash + 'g,
    E: Fn(V) -> Option<&'g FxHashMap<V, L>>,
    C: Fn(&L, &L) -> L,
{
    let mut labels: FxHashMap<V, FxHashSet<L>> = FxHashMap::default();
    labels.entry(start).or_default().insert(identity);

    let mut queue = VecDeque::new();
    queue.push_back(start);
    let mut queued: FxHashSet<V> = FxHashSet::default();
    queued.insert(start);

    while let Some(vertex) = queue.pop_front() {
        queued.remove(&vertex);
        let Some(out) = edges(vertex) else {
            continue;
        };
        if out.contains_key(&vertex) {
            return Err(SelfLoop(vertex));
        }
        let current: Vec<L> = labels
            .get(&vertex)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        for (target, nature) in out {
            let known = labels.entry(*target).or_default();
            let mut grew = false;
            for label in &current {
                if known.insert(combine(label, nature)) {
                    grew = true;
                }
            }
            if grew && queued.insert(*target) {
                queue.push_back(*target);
            }
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32, &'static str)]) -> FxHashMap<u32, FxHashMap<u32, &'static str>> {
        let mut g: FxHashMap<u32, FxHashMap<u32, &'static str>> = FxHashMap::default();
        for (a, b, l) in edges {
            g.entry(*a).or_default().insert(*b, l);
        }
        g
    }

    fn max(a: &u8, b: &u8) -> u8 {
        *a.max(b)
    }

    #[test]
    fn test_single_path_yields_single_label() {
        let mut g: FxHashMap<u32, FxHashMap<u32, u8>> = FxHashMap::default();
        g.entry(0).or_default().insert(1, 3);
        g.entry(1).or_default().insert(2, 5);
        let labels = compute_path_labels(|v| g.get(&v), 0, 0u8, max).unwrap();
        assert_eq!(labels[&2].len(), 1);
        assert!(labels[&2].contains(&5));
    }

    #[test]
    fn test_two_paths_keep_both_labels() {
        let mut g: FxHashMap<u32, FxHashMap<u32, u8>> = FxHashMap::default();
        g.entry(0).or_default().insert(1, 2);
        g.entry(0).or_default().insert(2, 7);
        g.entry(1).or_default().insert(3, 1);
        g.entry(2).or_default().insert(3, 1);
        let labels = compute_path_labels(|v| g.get(&v), 0, 0u8, max).unwrap();
        let at3 = &labels[&3];
        assert_eq!(at3.len(), 2);
        assert!(at3.contains(&2) && at3.contains(&7));
    }

    #[test]
    fn test_cycles_terminate() {
        let mut g: FxHashMap<u32, FxHashMap<u32, u8>> = FxHashMap::default();
        g.entry(0).or_default().insert(1, 1);
        g.entry(1).or_default().insert(0, 2);
        let labels = compute_path_labels(|v| g.get(&v), 0, 0u8, max).unwrap();
        assert!(labels[&0].contains(&2));
    }

    #[test]
    fn test_self_loop_rejected() {
        let g = graph(&[(0, 1, "a"), (1, 1, "b")]);
        let result = compute_path_labels(|v| g.get(&v), 0, "", |_, l| *l);
        assert_eq!(result.unwrap_err(), SelfLoop(1));
    }
}
