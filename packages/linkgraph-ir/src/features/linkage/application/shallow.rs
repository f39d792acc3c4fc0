//! Shallow summaries: linkage from declared facts and signatures only
//!
//! Used for abstract methods, methods of external types, recursion cut-offs
//! and when `force_shallow` is set. No statement is read.
//!
//! ```text
//! identity                          rv ← 0:p
//! T get()           (instance)      rv ∈ this.§ts   | rv ← this.§t
//! List<T> sub()     independent hc  rv.§ts ⊆ this.§ts
//!                   dependent       rv.§ts ~ this.§ts, rv.§m ≡ this.§m
//! add(T t)          (instance)      0:t ∈ this.§ts
//! addAll(List<T> c)                 0:c.§ts ⊆ this.§ts
//! <init>(List<T> c)                 0:c.§ts ⊇ this.§ts
//! static T first(List<T> l)         rv ∈ 0:l.§ts
//! static wrap(List<T> l), dependent rv ⊰ 0:l
//! supplier / function / consumer    rv ← p | rv.§ts ⊆ p | p ∈ this.§ts
//! ```
//!
//! Parameters declared independent never link; primitives and strings never link.

use crate::features::linkage::domain::{Link, LinkNature, Links, MethodLinkedVariables};
use crate::features::linkage::ports::{HiddenContentProvider, MethodFactProvider, TypeModel};
use crate::shared::models::{
    Index, IndependenceLevel, MethodInfo, ParameterizedType, Variable, RETURN_SLOT,
};
use std::collections::BTreeSet;
use tracing::trace;

/// Shape of a functional interface, from its single abstract method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamShape {
    /// No input, produces a value
    Supplier,
    /// Input, no output
    Consumer,
    /// One input, one output
    Function,
    Other,
}

impl SamShape {
    pub fn of(sam: &MethodInfo) -> Self {
        let produces = !sam.return_type.is_void();
        match (sam.parameters.len(), produces) {
            (0, true) => SamShape::Supplier,
            (n, false) if n > 0 => SamShape::Consumer,
            (1, true) => SamShape::Function,
            _ => SamShape::Other,
        }
    }
}

/// The receiver of an instance method, `None` for static methods
pub fn receiver(model: &dyn TypeModel, method: &MethodInfo) -> Option<Variable> {
    if method.is_static {
        return None;
    }
    Some(
        model
            .type_info(&method.owner)
            .map(|t| t.this_variable())
            .unwrap_or_else(|| Variable::this(&method.owner, ParameterizedType::class(&method.owner))),
    )
}

pub struct ShallowLinkComputer<'a> {
    model: &'a dyn TypeModel,
    hidden: &'a dyn HiddenContentProvider,
    facts: &'a dyn MethodFactProvider,
}

impl<'a> ShallowLinkComputer<'a> {
    pub fn new(
        model: &'a dyn TypeModel,
        hidden: &'a dyn HiddenContentProvider,
        facts: &'a dyn MethodFactProvider,
    ) -> Self {
        Self {
            model,
            hidden,
            facts,
        }
    }

    pub fn compute(&self, method: &MethodInfo) -> MethodLinkedVariables {
        let this = receiver(self.model, method);
        let this_hc = this.as_ref().and_then(|t| self.hidden_content_of(t));
        let params = method.parameter_variables();
        let rv = method.return_variable();

        let mut rv_links = rv.as_ref().map(Links::new);
        let mut param_links: Vec<Links> = params.iter().map(Links::new).collect();

        // return value
        if let (Some(rv), Some(links)) = (rv.as_ref(), rv_links.as_mut()) {
            if !rv.ty().is_primitive_or_string() {
                self.return_links(method, rv, this.as_ref(), this_hc.as_ref(), &params, links);
            }
        }

        // parameters
        for (i, p) in params.iter().enumerate() {
            if p.ty().is_primitive_or_string() {
                continue;
            }
            let independence = self.facts.independence_of_parameter(method, i);
            if independence.is_independent() {
                continue;
            }
            if independence.level != IndependenceLevel::Independent {
                let receiver = this.as_ref().zip(this_hc.as_ref());
                let dependent = independence.level == IndependenceLevel::Dependent;
                self.parameter_links(method, p, dependent, receiver, rv.as_ref(), &mut rv_links, &mut param_links[i]);
            }

            // hidden-content links between parameters and to the return slot
            for (slot, _) in independence.links.iter() {
                let Some(p_hc) = self.hidden_content_of(p) else {
                    continue;
                };
                if *slot == RETURN_SLOT {
                    if let (Some(rv), Some(links)) = (rv.as_ref(), rv_links.as_mut()) {
                        if let Some(rv_hc) = self.hidden_content_of(rv) {
                            links.push(Link::new(&rv_hc, LinkNature::SHARES_ELEMENTS, &p_hc));
                        }
                    }
                } else if let Some(other) = params.get(*slot as usize).filter(|o| *o != p) {
                    if let Some(o_hc) = self.hidden_content_of(other) {
                        param_links[i].push(Link::new(&p_hc, LinkNature::SHARES_ELEMENTS, &o_hc));
                    }
                }
            }
        }

        let mut modified = BTreeSet::new();
        if !self.facts.is_pure(method) {
            if let Some(this) = &this {
                if self.facts.is_modifying(method) {
                    modified.insert(this.clone());
                }
            }
            for (i, p) in params.iter().enumerate() {
                if self.facts.is_parameter_modified(method, i) && self.model.is_mutable(p.ty()) {
                    modified.insert(p.clone());
                }
            }
        }

        let summary = MethodLinkedVariables::new(rv_links, param_links).with_modified(modified);
        trace!("shallow summary of {}: {}", method.id, summary);
        summary
    }

    /// Links of one non-independent parameter into the receiver or the return value
    fn parameter_links(
        &self,
        method: &MethodInfo,
        p: &Variable,
        dependent: bool,
        receiver: Option<(&Variable, &Variable)>,
        rv: Option<&Variable>,
        rv_links: &mut Option<Links>,
        links: &mut Links,
    ) {
        if let Some(sam) = self.model.single_abstract_method(p.ty()) {
            match (SamShape::of(&sam), rv, rv_links.as_mut()) {
                (SamShape::Supplier, Some(rv), Some(rv_links)) => {
                    rv_links.push(Link::new(rv, LinkNature::IS_ASSIGNED_FROM, p));
                }
                (SamShape::Function, Some(rv), Some(rv_links)) => {
                    if let Some(rv_hc) = self.hidden_content_of(rv) {
                        rv_links.push(Link::new(&rv_hc, LinkNature::IS_SUBSET_OF, p));
                    }
                }
                (SamShape::Consumer, _, _) => {
                    if let Some((_, hc)) = receiver {
                        links.push(Link::new(p, LinkNature::IS_ELEMENT_OF, hc));
                    }
                }
                _ => {}
            }
            return;
        }
        if method.is_static {
            return;
        }
        if let Some((this, hc)) = receiver {
            self.parameter_into_receiver(method, p, hc, links);
            if method.is_constructor && dependent {
                self.share_mutation(p, this, links);
            }
        }
    }

    fn return_links(
        &self,
        method: &MethodInfo,
        rv: &Variable,
        this: Option<&Variable>,
        this_hc: Option<&Variable>,
        params: &[Variable],
        links: &mut Links,
    ) {
        if self.facts.is_identity(method) {
            if let Some(p0) = params.first() {
                links.push(Link::new(rv, LinkNature::IS_ASSIGNED_FROM, p0));
            }
            return;
        }

        if let (Some(this), Some(this_hc)) = (this, this_hc) {
            let independence = self.facts.independence_of_method(method);
            if !independence.is_independent() {
                match self.hidden_content_of(rv) {
                    Some(rv_hc) => {
                        if independence.level == IndependenceLevel::IndependentHc {
                            links.push(Link::new(&rv_hc, LinkNature::IS_SUBSET_OF, this_hc));
                        } else {
                            links.push(Link::new(&rv_hc, LinkNature::SHARES_ELEMENTS, this_hc));
                            self.share_mutation(rv, this, links);
                        }
                    }
                    None => {
                        if let Some((nature, target)) =
                            element_relation(rv, this_hc, LinkNature::IS_ASSIGNED_FROM)
                        {
                            links.push(Link::new(rv, nature, &target));
                        }
                    }
                }
            }
        }

        if method.is_static {
            for (i, p) in params.iter().enumerate() {
                if p.ty().is_primitive_or_string() || self.model.single_abstract_method(p.ty()).is_some() {
                    continue;
                }
                let independence = self.facts.independence_of_parameter(method, i);
                if independence.is_independent() {
                    continue;
                }
                let Some(p_hc) = self.hidden_content_of(p) else {
                    continue;
                };
                match self.hidden_content_of(rv) {
                    Some(_)
                        if independence.level == IndependenceLevel::Dependent
                            && rv.ty().type_name() == p.ty().type_name() =>
                    {
                        links.push(Link::new(rv, LinkNature::IS_DECORATED_WITH, p));
                    }
                    Some(rv_hc) => {
                        links.push(Link::new(&rv_hc, LinkNature::IS_SUBSET_OF, &p_hc));
                    }
                    None => {
                        if let Some((nature, target)) =
                            element_relation(rv, &p_hc, LinkNature::IS_ASSIGNED_FROM)
                        {
                            links.push(Link::new(rv, nature, &target));
                        }
                    }
                }
            }
        }
    }

    /// `add(T t)`, `addAll(List<T> c)` and constructor variants
    fn parameter_into_receiver(
        &self,
        method: &MethodInfo,
        p: &Variable,
        this_hc: &Variable,
        links: &mut Links,
    ) {
        match self.hidden_content_of(p) {
            Some(p_hc) if p_hc.ty().arrays == this_hc.ty().arrays => {
                let nature = if method.is_constructor {
                    LinkNature::IS_SUPERSET_OF
                } else {
                    LinkNature::IS_SUBSET_OF
                };
                links.push(Link::new(&p_hc, nature, this_hc));
            }
            Some(_) => {}
            None => {
                if let Some((nature, target)) =
                    element_relation(p, this_hc, LinkNature::IS_ASSIGNED_TO)
                {
                    links.push(Link::new(p, nature, &target));
                }
            }
        }
    }

    fn share_mutation(&self, v: &Variable, other: &Variable, links: &mut Links) {
        let (Some(m), Some(om)) = (
            self.hidden.mutation_field(v.ty()),
            self.hidden.mutation_field(other.ty()),
        ) else {
            return;
        };
        links.push(Link::new(
            &Variable::field(m, Some(v.clone())),
            LinkNature::IS_IDENTICAL_TO,
            &Variable::field(om, Some(other.clone())),
        ));
    }

    fn hidden_content_of(&self, v: &Variable) -> Option<Variable> {
        self.hidden
            .hidden_content(v.ty())
            .map(|hc| Variable::field(hc, Some(v.clone())))
    }
}

/// Relation between a value `x` and hidden content `hc` holding values of
/// `x`'s type: `∈` when `hc` has one more dimension, `same_dims` when equal.
/// Tuple-typed hidden content is matched through the component's slice.
fn element_relation(
    x: &Variable,
    hc: &Variable,
    same_dims: LinkNature,
) -> Option<(LinkNature, Variable)> {
    let x_ty = x.ty();
    let hc_ty = hc.ty();
    let target = match hc_ty.tuple_components() {
        Some(components) => {
            let i = components.iter().position(|c| c.base == x_ty.base)?;
            Variable::element(hc.clone(), Index::Constant(-(i as i64) - 1))
        }
        None if hc_ty.base == x_ty.base => hc.clone(),
        None => return None,
    };
    let (xa, ta) = (x_ty.arrays, target.ty().arrays);
    if ta == xa + 1 {
        Some((LinkNature::IS_ELEMENT_OF, target))
    } else if ta == xa {
        Some((same_dims, target))
    } else {
        None
    }
}
