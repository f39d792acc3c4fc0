//! Inlining a callee summary at a call site
//!
//! ```text
//! callee space          caller space
//! this               →  object of the call
//! P#i                →  argument i          (varargs: each trailing argument)
//! rv                 →  $__rvN              (fresh intermediate)
//! this.§es           →  object.§ts          (hidden content retargeted)
//! ```
//!
//! Links whose endpoint is a functional parameter bound to a lambda or method
//! reference go through `FunctionalInterfaceLinker` instead of being copied.

use super::context::MethodContext;
use super::functional_interface::FunctionalInterfaceLinker;
use super::shallow::{receiver, SamShape};
use crate::errors::{LinkError, Phase, Result};
use crate::features::linkage::domain::{
    Link, LinkKind, LinkNature, LinkResult, MethodLinkedVariables, PendingCall, VariableData,
};
use crate::features::linkage::infrastructure::TranslationMap;
use crate::shared::models::{
    ConstructorCall, MarkerKind, MethodCall, MethodInfo, MethodRef, ParameterizedType, Variable,
    VariableKind,
};
use std::sync::Arc;
use tracing::trace;

/// Trailing arguments bound to a variable-arity parameter
struct Varargs {
    parameter: Variable,
    values: Vec<Variable>,
}

pub struct LinkMethodCall<'a, 'c> {
    ctx: &'a MethodContext<'c>,
    snapshot: &'a VariableData,
}

impl<'a, 'c> LinkMethodCall<'a, 'c> {
    pub fn new(ctx: &'a MethodContext<'c>, snapshot: &'a VariableData) -> Self {
        Self { ctx, snapshot }
    }

    /// `object.method(arguments)`; object and arguments are already evaluated
    pub fn method_call(
        &self,
        call: &MethodCall,
        object: Option<LinkResult>,
        arguments: Vec<LinkResult>,
    ) -> Result<LinkResult> {
        let callee = self.callee(&call.method)?;
        let object_var = object.as_ref().map(|o| o.primary().clone());
        let args: Vec<Variable> = arguments.iter().map(|a| a.primary().clone()).collect();

        let result_var = self.result_variable(&callee, object_var.as_ref());
        let mut result = LinkResult::of(&result_var);
        let produces = callee.return_variable().is_some();

        let applied = object_var
            .as_ref()
            .filter(|o| self.is_single_abstract_method(o, &callee))
            .and_then(|o| self.functional_value(o));
        match applied.as_ref().and_then(|phi| phi.payload()) {
            Some(payload) => {
                trace!("{} invokes a known functional value", call.method);
                let linker = self.linker();
                let inlined = linker.inline(payload, produces.then_some(&result_var), &args);
                for link in inlined.links {
                    route(&mut result, link);
                }
                for v in inlined.modified {
                    result.mark_modified(&v, Some(&callee.id));
                }
            }
            None => {
                let summary = self.ctx.callee_summary(&callee)?;
                let rv_target = produces.then_some(&result_var);
                self.inline_summary(&callee, &summary, object_var.as_ref(), &args, rv_target, &mut result)?;
            }
        }

        if let Some(o) = &object_var {
            result.pending.push(PendingCall {
                method: callee.id.clone(),
                object: o.clone(),
            });
        }
        if let Some(o) = object {
            result.absorb(o);
        }
        for a in arguments {
            result.absorb(a);
        }
        Ok(result)
    }

    /// `new T(arguments)`; the new object is a fresh intermediate
    pub fn constructor_call(
        &self,
        call: &ConstructorCall,
        arguments: Vec<LinkResult>,
    ) -> Result<LinkResult> {
        let object = Variable::intermediate(&self.ctx.fresh("$__c"), call.ty.clone());
        let mut result = LinkResult::of(&object);
        if let Some(id) = &call.constructor {
            let callee = self.callee(id)?;
            let summary = self.ctx.callee_summary(&callee)?;
            let args: Vec<Variable> = arguments.iter().map(|a| a.primary().clone()).collect();
            self.inline_summary(&callee, &summary, Some(&object), &args, None, &mut result)?;
        }
        for a in arguments {
            result.absorb(a);
        }
        Ok(result)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Summary translation
    // ═══════════════════════════════════════════════════════════════════════

    fn inline_summary(
        &self,
        callee: &MethodInfo,
        summary: &MethodLinkedVariables,
        object: Option<&Variable>,
        args: &[Variable],
        result_var: Option<&Variable>,
        result: &mut LinkResult,
    ) -> Result<()> {
        let hidden = self.ctx.hidden();
        let mut map = TranslationMap::new(hidden);
        if let (Some(o), Some(this)) = (object, receiver(self.ctx.model(), callee)) {
            map.put(&this, o);
        }
        let varargs = varargs(callee, args);
        let params = callee.parameter_variables();
        for (p, a) in params.iter().zip(args) {
            if varargs.as_ref().map_or(true, |v| &v.parameter != p) {
                map.put(p, a);
            }
        }
        if let (Some(rv), Some(r)) = (callee.return_variable(), result_var) {
            map.put(&rv, r);
        }

        let returned = summary.of_return().filter(|_| result_var.is_some());
        for links in returned.into_iter().chain(summary.of_parameters()) {
            for link in links {
                if let Some(derived) = self.functional_argument(link, &params, args, object, &map)? {
                    for l in derived {
                        route(result, l);
                    }
                    continue;
                }
                match &varargs {
                    Some(v) => {
                        for l in expand_varargs(link, v, &map) {
                            route(result, l);
                        }
                    }
                    None => route(result, map.translate_link(link)),
                }
            }
        }

        for m in summary.modified() {
            let targets = match &varargs {
                Some(v) if m.is_part_of(&v.parameter) => v
                    .values
                    .iter()
                    .map(|a| m.substitute(&v.parameter, a))
                    .collect(),
                _ => vec![map.translate(m)],
            };
            for t in targets.iter().filter(|t| !is_callee_variable(t, callee)) {
                result.mark_modified(t, Some(&callee.id));
            }
        }
        Ok(())
    }

    /// Links of a functional parameter whose argument is a lambda or method reference
    fn functional_argument(
        &self,
        link: &Link,
        params: &[Variable],
        args: &[Variable],
        object: Option<&Variable>,
        map: &TranslationMap<'_>,
    ) -> Result<Option<Vec<Link>>> {
        let bound = |v: &Variable| {
            params
                .iter()
                .position(|p| p == v)
                .and_then(|i| args.get(i))
                .and_then(|a| a.payload().map(|payload| (a, payload)))
        };
        // orient as `x nature Φ`
        let (x, nature, (phi, payload)) = match (bound(&link.to), bound(&link.from)) {
            (Some(b), None) => (map.translate(&link.from), link.nature.clone(), b),
            (None, Some(b)) => (map.translate(&link.to), link.nature.reverse(), b),
            (None, None) => {
                // parts of a functional parameter carry nothing
                let on_functional = params.iter().zip(args).any(|(p, a)| {
                    a.is_functional() && (link.from.is_part_of(p) || link.to.is_part_of(p))
                });
                return Ok(on_functional.then(Vec::new));
            }
            (Some(_), Some(_)) => return Ok(Some(Vec::new())),
        };

        let linker = self.linker();
        let view = linker.view(payload);
        let Some(sam) = self.ctx.model().single_abstract_method(phi.ty()) else {
            trace!("{} has no single abstract method, dropping its links", phi);
            return Ok(Some(Vec::new()));
        };
        let derived = match SamShape::of(&sam) {
            SamShape::Supplier => linker.supplier(&x, &nature, &view),
            SamShape::Consumer => linker.consumer(&x, &nature, &view),
            SamShape::Function => {
                let source = object.and_then(|o| {
                    self.ctx
                        .hidden()
                        .hidden_content(o.ty())
                        .map(|hc| Variable::field(hc, Some(o.clone())))
                });
                linker.function(&x, source.as_ref(), &view)?
            }
            SamShape::Other if view.is_empty() => Vec::new(),
            SamShape::Other => {
                return Err(LinkError::unsupported(
                    self.ctx.id(),
                    Phase::FunctionalInterface,
                    format!(
                        "{} with {} parameters passed to {}",
                        phi.ty(),
                        sam.parameters.len(),
                        link.from
                    ),
                ))
            }
        };
        Ok(Some(derived))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════════

    fn callee(&self, id: &MethodRef) -> Result<Arc<MethodInfo>> {
        self.ctx.model().method(id).ok_or_else(|| {
            LinkError::unsupported(self.ctx.id(), Phase::MethodCall, format!("unknown method {}", id))
        })
    }

    fn linker(&self) -> FunctionalInterfaceLinker<'_> {
        FunctionalInterfaceLinker::new(self.ctx.model(), self.ctx.hidden(), self.ctx.id())
    }

    /// Temporary holding the call's value; void calls produce an unlinked marker
    fn result_variable(&self, callee: &MethodInfo, object: Option<&Variable>) -> Variable {
        match callee.return_variable() {
            Some(rv) => {
                let model = self.ctx.model();
                let ty = match object {
                    Some(o) => model.substitute(rv.ty(), &model.type_arguments(o.ty())),
                    None => rv.ty().clone(),
                };
                Variable::intermediate(&self.ctx.fresh("$__rv"), ty)
            }
            None => Variable::marker(
                &self.ctx.fresh("$__v"),
                ParameterizedType::void(),
                MarkerKind::SomeValue,
            ),
        }
    }

    fn is_single_abstract_method(&self, object: &Variable, callee: &MethodInfo) -> bool {
        self.ctx
            .model()
            .single_abstract_method(object.ty())
            .map_or(false, |sam| sam.id == callee.id)
    }

    /// The lambda or method reference `object` holds, if known
    fn functional_value(&self, object: &Variable) -> Option<Variable> {
        if object.payload().is_some() {
            return Some(object.clone());
        }
        self.snapshot.get(object).and_then(|links| {
            links
                .iter()
                .find(|l| &l.from == object && l.nature.is_identical_or_assigned() && l.to.payload().is_some())
                .map(|l| l.to.clone())
        })
    }
}

/// Primary links of the call's value stay in the result; the rest are side effects
fn route(result: &mut LinkResult, link: Link) {
    if link.from == link.to || !link.nature.valid() {
        return;
    }
    if link.from.is_part_of(result.primary()) {
        result.links.push(link);
    } else {
        result.add_extra(link);
    }
}

fn is_callee_variable(v: &Variable, callee: &MethodInfo) -> bool {
    matches!(v.kind(), VariableKind::Parameter { method, .. } if method == &callee.id)
}

fn varargs(callee: &MethodInfo, args: &[Variable]) -> Option<Varargs> {
    let last = callee.parameters.last().filter(|p| p.varargs)?;
    let k = callee.parameters.len() - 1;
    // an array passed directly binds like any other argument
    if args.len() == callee.parameters.len() && args[k].ty().arrays == last.ty.arrays {
        return None;
    }
    Some(Varargs {
        parameter: callee.parameter_variable(k)?,
        values: args.get(k..).map(<[Variable]>::to_vec).unwrap_or_default(),
    })
}

/// A link touching the varargs parameter, once per trailing argument.
/// Relations with the array itself become relations with one of its elements.
fn expand_varargs(link: &Link, varargs: &Varargs, map: &TranslationMap<'_>) -> Vec<Link> {
    let pk = &varargs.parameter;
    let (from_in, to_in) = (link.from.is_part_of(pk), link.to.is_part_of(pk));
    if !from_in && !to_in {
        return vec![map.translate_link(link)];
    }
    if from_in && to_in {
        return Vec::new();
    }
    let (other, nature, side) = if to_in {
        (map.translate(&link.from), link.nature.clone(), &link.to)
    } else {
        (map.translate(&link.to), link.nature.reverse(), &link.from)
    };

    let mut result = Vec::new();
    for a in &varargs.values {
        let (target, n) = if side == pk {
            let n = match nature.kind() {
                LinkKind::IsIdenticalTo
                | LinkKind::IsAssignedFrom
                | LinkKind::IsAssignedTo
                | LinkKind::ObjectGraphOverlaps
                | LinkKind::SharesElements
                | LinkKind::IsSubsetOf
                | LinkKind::IsSupersetOf => LinkNature::CONTAINS_AS_MEMBER,
                LinkKind::IsElementOf => LinkNature::IS_ASSIGNED_FROM,
                _ => continue,
            };
            (a.clone(), n)
        } else {
            let element_replaced = side.map_parts(&mut |v| match v.kind() {
                VariableKind::Element { array, .. } if array == pk => Some(a.clone()),
                _ => None,
            });
            if element_replaced.is_part_of(pk) {
                continue;
            }
            (map.translate(&element_replaced), nature.clone())
        };
        let link = if to_in {
            Link::new(&other, n, &target)
        } else {
            Link::new(&target, n.reverse(), &other)
        };
        if !result.contains(&link) {
            result.push(link);
        }
    }
    result
}
