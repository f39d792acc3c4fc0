//! Source computation of one method: walk the body, one snapshot per statement
//!
//! ```text
//! prev snapshot ─► erase reassigned ─► + expression links ─► close graph
//!                                                              │
//!        next snapshot ◄── record call sites ◄── project every known primary
//! ```
//!
//! Statement indices are dotted paths: `2` is the third top-level statement,
//! `2.1.0` the first statement of its second sub-block. Every sub-block of a
//! statement starts from the same snapshot; afterwards the surviving
//! variables are merged by union of their links.

use super::context::MethodContext;
use super::expression_visitor::ExpressionVisitor;
use crate::errors::Result;
use crate::features::linkage::domain::{
    add_link, Link, LinkNature, LinkResult, LinkedToObject, LinkedVariables, Links, MethodLinkedVariables,
    VariableData,
};
use crate::features::linkage::infrastructure::{follow_graph, GraphBuilder, LinkGraph};
use crate::shared::models::{Block, Expression, MethodRef, Statement, Variable};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

pub struct SourceOutcome {
    pub summary: MethodLinkedVariables,
    /// Snapshot after each statement, keyed by statement index
    pub snapshots: BTreeMap<String, VariableData>,
}

pub struct SourceMethodComputer<'a, 'c> {
    ctx: &'a MethodContext<'c>,
    snapshots: BTreeMap<String, VariableData>,
    modified: BTreeMap<Variable, BTreeSet<MethodRef>>,
    declared: BTreeSet<Variable>,
}

impl<'a, 'c> SourceMethodComputer<'a, 'c> {
    pub fn new(ctx: &'a MethodContext<'c>) -> Self {
        let declared = ctx
            .method()
            .body
            .as_ref()
            .map(|b| b.declared_locals().into_iter().collect())
            .unwrap_or_default();
        Self {
            ctx,
            snapshots: BTreeMap::new(),
            modified: BTreeMap::new(),
            declared,
        }
    }

    pub fn compute(mut self) -> Result<SourceOutcome> {
        let method = self.ctx.method().clone();
        debug!("source computation of {}", method.id);

        let mut initial = VariableData::new("-");
        for p in method.parameter_variables() {
            if !p.ty().is_primitive_or_string() {
                initial.insert(Links::new(&p));
            }
        }
        let last = match &method.body {
            Some(body) => self.block(body, None, initial)?,
            None => initial,
        };
        let summary = self.finish(&last);
        debug!("{} → {}", method.id, summary);
        Ok(SourceOutcome {
            summary,
            snapshots: self.snapshots,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════

    fn block(&mut self, block: &Block, prefix: Option<&str>, start: VariableData) -> Result<VariableData> {
        let mut current = start;
        for (i, statement) in block.statements.iter().enumerate() {
            let index = match prefix {
                Some(p) => format!("{}.{}", p, i),
                None => i.to_string(),
            };
            current = self.statement(statement, &index, &current)?;
        }
        Ok(current)
    }

    fn statement(&mut self, statement: &Statement, index: &str, prev: &VariableData) -> Result<VariableData> {
        trace!("{} statement {}", self.ctx.id(), index);
        let data = match statement {
            Statement::LocalVariableCreation {
                variable,
                initializer,
            } => {
                let mut result = match initializer {
                    Some(e) => {
                        let value = self.visit(e, prev)?;
                        LinkResult::with_links(
                            Links::new(variable).with(LinkNature::IS_IDENTICAL_TO, value.primary()),
                        )
                        .merge(value)
                    }
                    None => LinkResult::of(variable),
                };
                result.erase.insert(variable.clone());
                self.apply(result, index, prev)?
            }
            Statement::Expression(e) | Statement::Throw(e) => {
                let result = self.visit(e, prev)?;
                self.apply(result, index, prev)?
            }
            Statement::Return(None) => prev.successor(index),
            Statement::Return(Some(e)) => {
                let value = self.visit(e, prev)?;
                let result = match self.ctx.method().return_variable() {
                    Some(rv) => LinkResult::with_links(
                        Links::new(&rv).with(LinkNature::IS_ASSIGNED_FROM, value.primary()),
                    )
                    .merge(value),
                    None => value,
                };
                self.apply(result, index, prev)?
            }
            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.visit(condition, prev)?;
                let base = self.apply(condition, index, prev)?;
                let mut blocks = vec![then_block];
                blocks.extend(else_block.iter());
                self.branches(index, &base, &blocks, else_block.is_none())?
            }
            Statement::While { condition, body } => {
                let condition = self.visit(condition, prev)?;
                let base = self.apply(condition, index, prev)?;
                self.branches(index, &base, &[body], true)?
            }
            Statement::ForEach {
                variable,
                iterable,
                body,
            } => {
                let iterable = self.visit(iterable, prev)?;
                let mut links = Links::new(variable);
                if let Some(container) = self.element_container(variable, iterable.primary()) {
                    links.push(Link::new(variable, LinkNature::IS_ELEMENT_OF, &container));
                }
                let mut result = LinkResult::with_links(links).merge(iterable);
                result.erase.insert(variable.clone());
                let base = self.apply(result, index, prev)?;
                self.branches(index, &base, &[body], true)?
            }
            Statement::Block(block) => self.branches(index, prev, &[block], false)?,
        };
        self.snapshots.insert(index.to_string(), data.clone());
        Ok(data)
    }

    /// Run each block against `base`, then keep the union of what survives
    fn branches(
        &mut self,
        index: &str,
        base: &VariableData,
        blocks: &[&Block],
        include_base: bool,
    ) -> Result<VariableData> {
        let mut merged = VariableData::new(index);
        if include_base {
            merged.merge_branch(base);
        } else {
            merged.absorb_effects(base);
        }
        for (k, block) in blocks.iter().enumerate() {
            let prefix = format!("{}.{}", index, k);
            let mut out = self.block(block, Some(&prefix), base.clone())?;
            out.retain_variables(|v| base.contains(v) || !v.is_local());
            merged.merge_branch(&out);
        }
        Ok(merged)
    }

    fn visit(&self, expression: &Expression, snapshot: &VariableData) -> Result<LinkResult> {
        ExpressionVisitor::new(self.ctx, snapshot).visit(expression)
    }

    /// The variable holding the elements `variable` iterates over: the array
    /// itself, or the hidden content of a container
    fn element_container(&self, variable: &Variable, iterable: &Variable) -> Option<Variable> {
        let arrays = variable.ty().arrays;
        if iterable.ty().arrays == arrays + 1 {
            return Some(iterable.clone());
        }
        let hc = self.ctx.hidden().hidden_content(iterable.ty())?;
        (hc.ty.arrays == arrays + 1).then(|| Variable::field(hc, Some(iterable.clone())))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // One statement's effect on the snapshot
    // ═══════════════════════════════════════════════════════════════════════

    fn apply(&mut self, result: LinkResult, index: &str, prev: &VariableData) -> Result<VariableData> {
        let erased = &result.erase;
        let touches_erased = |v: &Variable| erased.iter().any(|e| v.is_part_of(e));

        let mut facts = LinkedVariables::new();
        for (v, links) in prev.iter() {
            if erased.contains(v) {
                continue;
            }
            let mut kept = links.clone();
            kept.retain(|l| !touches_erased(&l.from) && !touches_erased(&l.to));
            facts.insert(v.clone(), kept);
        }
        let new_links = std::iter::once(&result.links).chain(result.extra.values());
        for links in new_links {
            for link in links {
                if link.from != link.to && linkable(&link.from) && linkable(&link.to) {
                    add_link(&mut facts, link.clone());
                }
            }
        }

        let graph = GraphBuilder::new(self.ctx.hidden(), self.ctx.config(), self.ctx.id())
            .make_graph(&facts, &result.modified)?;

        let mut primaries: BTreeSet<Variable> = prev.variables().cloned().collect();
        primaries.extend(facts.keys().cloned());
        primaries.insert(result.primary().primary());
        primaries.retain(|v| !is_temporary(v));

        let mut data = VariableData::new(index);
        for p in &primaries {
            let mut links = follow_graph(&graph, p, self.ctx.hidden(), self.ctx.config())?;
            links.retain(|l| !l.to.root().is_intermediate());
            data.insert(links);
        }

        for (v, causes) in &result.modified {
            for m in self.modified_through(&graph, v) {
                data.mark_modified(&m, causes);
                self.modified.entry(m).or_default().extend(causes.iter().cloned());
            }
        }

        for (n, call) in result.pending.iter().enumerate() {
            let mut linked = LinkedToObject::new();
            linked.insert(call.object.clone(), true);
            let links = follow_graph(&graph, &call.object, self.ctx.hidden(), self.ctx.config())?;
            for l in &links {
                if !l.to.root().is_intermediate() {
                    linked.entry(l.to.clone()).or_insert(false);
                }
            }
            data.record_call_site(format!("{}#{}", index, n), linked);
        }
        Ok(data)
    }

    /// `v` and everything identical to or assigned from it in `graph`,
    /// directly or through shared mutation markers
    fn modified_through(&self, graph: &LinkGraph, v: &Variable) -> Vec<Variable> {
        let mut seen: BTreeSet<Variable> = BTreeSet::new();
        let mut stack = vec![v.clone()];
        let mut result = Vec::new();
        while let Some(x) = stack.pop() {
            if !seen.insert(x.clone()) {
                continue;
            }
            if let Some(id) = graph.vertex_of(&x) {
                for (to, nature) in graph.edges_of(id) {
                    if nature.is_identical_or_assigned() {
                        stack.push(graph.variable(*to).clone());
                    }
                }
            }
            if let Some(m) = self.ctx.hidden().mutation_field(x.ty()) {
                let marker = Variable::field(m, Some(x.clone()));
                if let Some(id) = graph.vertex_of(&marker) {
                    for (to, nature) in graph.edges_of(id) {
                        let other = graph.variable(*to);
                        if nature.is_identical() && other.is_mutation_marker() {
                            if let Some(scope) = other.scope() {
                                stack.push(scope.clone());
                            }
                        }
                    }
                }
            }
            let target = if x.is_mutation_marker() {
                match x.scope() {
                    Some(s) => s.clone(),
                    None => continue,
                }
            } else {
                x
            };
            if !target.is_virtual_field() && !is_temporary(&target.root()) {
                result.push(target);
            }
        }
        result
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Summary
    // ═══════════════════════════════════════════════════════════════════════

    fn finish(&self, last: &VariableData) -> MethodLinkedVariables {
        let method = self.ctx.method();
        let of_return = method.return_variable().map(|rv| {
            let mut links = last.links_of(&rv);
            links.retain(|l| self.is_public(&l.to));
            links
        });

        let of_parameters = method
            .parameter_variables()
            .iter()
            .map(|p| {
                let mut links = last.links_of(p);
                let in_return = of_return
                    .as_ref()
                    .map_or(false, |r| r.iter().any(|l| l.to.root() == *p));
                links.retain(|l| {
                    self.is_public(&l.to) && !(in_return && l.to.root().is_return())
                });
                links
            })
            .collect();

        let mut modified = BTreeSet::new();
        for v in self.modified.keys() {
            let root = v.root();
            if root.is_this() {
                modified.insert(v.clone());
            } else if root.is_parameter() && !root.ty().is_primitive_or_string() {
                modified.insert(root);
            }
        }
        MethodLinkedVariables::new(of_return, of_parameters).with_modified(modified)
    }

    /// Targets a caller can see: no temporaries, no locals of this body
    fn is_public(&self, to: &Variable) -> bool {
        let root = to.root();
        !is_temporary(&root) && !self.declared.contains(&root)
    }
}

/// Intermediates, markers and functional values never leave an expression
fn is_temporary(v: &Variable) -> bool {
    v.is_intermediate() || v.is_marker() || v.is_functional()
}

/// Primitive values carry no links; virtual fields are linkable whatever their type
fn linkable(v: &Variable) -> bool {
    v.is_virtual_field() || !v.ty().is_primitive_or_string()
}
