//! Arena graph over canonical variables
//!
//! Vertices are small integer ids; a variable maps to its vertex through its
//! canonical key, so differently-keyed views of the same slot share a vertex.
//! Adjacency is one map per vertex.

use crate::features::linkage::domain::{Link, LinkNature};
use crate::shared::models::{Variable, VariableKind};
use rustc_hash::FxHashMap;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    variables: Vec<Variable>,
    index: FxHashMap<Box<str>, VertexId>,
    edges: Vec<FxHashMap<VertexId, LinkNature>>,
    edge_count: usize,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertex of `v`, created on first use. The first variable seen for a
    /// canonical key is the one the vertex reports.
    pub fn vertex(&mut self, v: &Variable) -> VertexId {
        if let Some(id) = self.index.get(v.canonical_key()) {
            return *id;
        }
        let id = VertexId(self.variables.len() as u32);
        self.variables.push(v.clone());
        self.edges.push(FxHashMap::default());
        self.index.insert(v.canonical_key().into(), id);
        id
    }

    pub fn vertex_of(&self, v: &Variable) -> Option<VertexId> {
        self.index.get(v.canonical_key()).copied()
    }

    pub fn variable(&self, id: VertexId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    pub fn vertex_count(&self) -> usize {
        self.variables.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.variables.len() as u32).map(VertexId)
    }

    pub fn edges_of(&self, id: VertexId) -> &FxHashMap<VertexId, LinkNature> {
        &self.edges[id.0 as usize]
    }

    pub fn edge(&self, from: VertexId, to: VertexId) -> Option<&LinkNature> {
        self.edges[from.0 as usize].get(&to)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Insertion
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert `from nature to`, merging with an existing edge by `combine`.
    /// Re-inserting the same nature leaves the edge untouched.
    /// Returns true when the edge is new or its nature changed. Self-loops are never inserted.
    pub fn merge_edge(&mut self, from: VertexId, nature: LinkNature, to: VertexId) -> bool {
        if from == to {
            return false;
        }
        let out = &mut self.edges[from.0 as usize];
        match out.get_mut(&to) {
            Some(existing) if *existing == nature => false,
            Some(existing) => {
                let combined = existing.combine(&nature);
                let merged = if combined.valid() {
                    combined
                } else {
                    existing.best(&nature)
                };
                if merged == *existing {
                    return false;
                }
                *existing = merged;
                true
            }
            None => {
                out.insert(to, nature);
                self.edge_count += 1;
                true
            }
        }
    }

    /// Insert the edge and its reverse
    pub fn merge_edge_bi(&mut self, from: VertexId, nature: LinkNature, to: VertexId) -> bool {
        let reverse = nature.reverse();
        let a = self.merge_edge(from, nature, to);
        let b = self.merge_edge(to, reverse, from);
        a || b
    }

    /// Insert a link in both directions, together with the containment edges
    /// that tie each endpoint to its enclosing variables.
    pub fn add_link(&mut self, link: &Link) -> bool {
        let mut changed = self.add_containment(&link.from);
        changed |= self.add_containment(&link.to);
        let from = self.vertex(&link.from);
        let to = self.vertex(&link.to);
        changed |= self.merge_edge_bi(from, link.nature.clone(), to);
        changed
    }

    /// `sub ≺ scope` for fields and slices, `sub ∈ scope` for elements, up to
    /// (not including) `this`
    pub fn add_containment(&mut self, v: &Variable) -> bool {
        let mut changed = false;
        let mut current = v.clone();
        self.vertex(&current);
        while let Some(scope) = current.scope().cloned() {
            if scope.is_this() {
                break;
            }
            let nature = match current.kind() {
                VariableKind::Element { index, .. } if !index.is_slice() => {
                    LinkNature::IS_ELEMENT_OF
                }
                _ => LinkNature::IS_FIELD_OF,
            };
            let sub = self.vertex(&current);
            let up = self.vertex(&scope);
            changed |= self.merge_edge_bi(sub, nature, up);
            current = scope;
        }
        changed
    }

    /// One line per edge, sorted: `from nature to`
    pub fn dump(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(self.edge_count);
        for (i, out) in self.edges.iter().enumerate() {
            for (to, nature) in out {
                lines.push(format!(
                    "{} {} {}",
                    self.variables[i],
                    nature,
                    self.variables[to.0 as usize]
                ));
            }
        }
        lines.sort();
        let mut out = String::new();
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
        out
    }
}
