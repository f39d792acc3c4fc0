//! Bottom-up evaluation of one expression into a `LinkResult`
//!
//! Temporaries are named per method: `$__rvN` call results, `$__cN` new
//! objects, `$__icN` inline conditionals, `$__aiN` array initializers,
//! `$__lN` lambdas and method references, `$__kN` constants, `$__vN` opaque
//! values. Markers and intermediates never reach a public summary.

use super::context::MethodContext;
use super::method_call::LinkMethodCall;
use crate::errors::{LinkError, Phase, Result};
use crate::features::linkage::domain::{Link, LinkNature, LinkResult, Links, VariableData};
use crate::shared::models::{
    Assignment, Constant, Expression, FunctionalPayload, InlineConditional, Lambda, MarkerKind,
    MethodReference, ParameterizedType, Variable, VariableKind,
};

pub struct ExpressionVisitor<'a, 'c> {
    ctx: &'a MethodContext<'c>,
    snapshot: &'a VariableData,
}

impl<'a, 'c> ExpressionVisitor<'a, 'c> {
    pub fn new(ctx: &'a MethodContext<'c>, snapshot: &'a VariableData) -> Self {
        Self { ctx, snapshot }
    }

    pub fn visit(&self, expression: &Expression) -> Result<LinkResult> {
        match expression {
            Expression::Variable(v) => Ok(LinkResult::of(v)),
            Expression::Constant(c) => Ok(LinkResult::of(&self.constant(c))),
            Expression::MethodCall(call) => {
                let object = call.object.as_ref().map(|o| self.visit(o)).transpose()?;
                let arguments = self.visit_all(&call.arguments)?;
                LinkMethodCall::new(self.ctx, self.snapshot).method_call(call, object, arguments)
            }
            Expression::ConstructorCall(call) => {
                let arguments = self.visit_all(&call.arguments)?;
                LinkMethodCall::new(self.ctx, self.snapshot).constructor_call(call, arguments)
            }
            Expression::Assignment(assignment) => self.assignment(assignment),
            Expression::InlineConditional(conditional) => self.conditional(conditional),
            Expression::ArrayInitializer { ty, elements } => self.array_initializer(ty, elements),
            Expression::BinaryOperator(left, right) => {
                self.opaque(ParameterizedType::int(), &[left.as_ref(), right.as_ref()])
            }
            Expression::UnaryOperator(e) | Expression::ArrayLength(e) => {
                self.opaque(ParameterizedType::int(), &[e.as_ref()])
            }
            Expression::InstanceOf(e) => self.opaque(ParameterizedType::boolean(), &[e.as_ref()]),
            Expression::Cast { expression, .. } => self.visit(expression),
            Expression::Lambda(lambda) => self.lambda(lambda),
            Expression::MethodReference(reference) => self.method_reference(reference),
        }
    }

    fn visit_all(&self, expressions: &[Expression]) -> Result<Vec<LinkResult>> {
        expressions.iter().map(|e| self.visit(e)).collect()
    }

    fn constant(&self, constant: &Constant) -> Variable {
        let ty = match constant {
            Constant::Null => ParameterizedType::void(),
            Constant::Boolean(_) => ParameterizedType::boolean(),
            Constant::Int(_) => ParameterizedType::int(),
            Constant::Str(_) => ParameterizedType::string(),
        };
        Variable::marker(&self.ctx.fresh("$__k"), ty, MarkerKind::Constant)
    }

    /// Operands are evaluated for their side effects; the value links to nothing
    fn opaque(&self, ty: ParameterizedType, operands: &[&Expression]) -> Result<LinkResult> {
        let value = Variable::marker(&self.ctx.fresh("$__v"), ty, MarkerKind::SomeValue);
        let mut result = LinkResult::of(&value);
        for operand in operands {
            result.absorb(self.visit(operand)?);
        }
        Ok(result)
    }

    /// `target = value`: the target's old links are erased unless it is one element among many
    fn assignment(&self, assignment: &Assignment) -> Result<LinkResult> {
        let value = self.visit(&assignment.value)?;
        let target = &assignment.target;
        let mut result = LinkResult::with_links(
            Links::new(target).with(LinkNature::IS_ASSIGNED_FROM, value.primary()),
        );
        match target.kind() {
            VariableKind::Element { .. } => {}
            _ => {
                result.erase.insert(target.clone());
            }
        }
        if target.scope().is_some() {
            result.mark_modified(&target.root(), None);
        }
        result.absorb(value);
        Ok(result)
    }

    fn conditional(&self, conditional: &InlineConditional) -> Result<LinkResult> {
        let condition = self.visit(&conditional.condition)?;
        let if_true = self.visit(&conditional.if_true)?;
        let if_false = self.visit(&conditional.if_false)?;

        let ty = if_true.primary().ty().clone();
        let value = Variable::intermediate(&self.ctx.fresh("$__ic"), ty);
        let mut result = LinkResult::with_links(
            Links::new(&value)
                .with(LinkNature::IS_ASSIGNED_FROM, if_true.primary())
                .with(LinkNature::IS_ASSIGNED_FROM, if_false.primary()),
        );
        let leak = self.ctx.config().leak_conditional_sub_links;
        for mut branch in [if_true, if_false] {
            if !leak {
                let primary = branch.primary().clone();
                branch.links.retain(|l| l.from == primary);
            }
            result.absorb(branch);
        }
        result.absorb(condition);
        Ok(result)
    }

    fn array_initializer(&self, ty: &ParameterizedType, elements: &[Expression]) -> Result<LinkResult> {
        let array = Variable::intermediate(&self.ctx.fresh("$__ai"), ty.clone());
        let values = self.visit_all(elements)?;
        let mut links = Links::new(&array);
        for v in &values {
            links.push(Link::new(&array, LinkNature::CONTAINS_AS_MEMBER, v.primary()));
        }
        let mut result = LinkResult::with_links(links);
        for v in values {
            result.absorb(v);
        }
        Ok(result)
    }

    fn lambda(&self, lambda: &Lambda) -> Result<LinkResult> {
        let method = self.ctx.model().method(&lambda.method).ok_or_else(|| {
            LinkError::unsupported(
                self.ctx.id(),
                Phase::Expression,
                format!("lambda {} has no method", lambda.method),
            )
        })?;
        let summary = self.ctx.callee_summary(&method)?;
        let value = Variable::functional(
            &self.ctx.fresh("$__l"),
            lambda.ty.clone(),
            FunctionalPayload {
                method: lambda.method.clone(),
                scope: None,
                summary,
            },
        );
        Ok(LinkResult::of(&value))
    }

    fn method_reference(&self, reference: &MethodReference) -> Result<LinkResult> {
        let scope = reference.scope.as_ref().map(|s| self.visit(s)).transpose()?;
        let method = self.ctx.model().method(&reference.method).ok_or_else(|| {
            LinkError::unsupported(
                self.ctx.id(),
                Phase::Expression,
                format!("unknown method {} in method reference", reference.method),
            )
        })?;
        let summary = self.ctx.callee_summary(&method)?;
        let value = Variable::functional(
            &self.ctx.fresh("$__l"),
            reference.ty.clone(),
            FunctionalPayload {
                method: reference.method.clone(),
                scope: scope.as_ref().map(|s| s.primary().clone()),
                summary,
            },
        );
        let mut result = LinkResult::of(&value);
        if let Some(s) = scope {
            result.absorb(s);
        }
        Ok(result)
    }
}
