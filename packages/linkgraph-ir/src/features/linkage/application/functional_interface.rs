//! Functional-interface cross-linking
//!
//! A lambda or method reference passed as an argument carries its own summary
//! (the payload). The callee's summary says what it does with the functional
//! parameter; this module combines the two.
//!
//! ```text
//! supplier   x n Φ,  Φ.rv n2 y            ⇒  x combine(n,n2) y
//! consumer   x n Φ,  Φ.in n2 y            ⇒  x combine(n,n2) y      (n is usually ∋)
//! function   target ⊆ Φ,  source = object hidden content
//!            Φ.rv ← Φ.in                  ⇒  target ⊆ source
//!            Φ.rv ∈ Φ.in                  ⇒  target ~ source with one dimension less
//!            Φ.rv n2 part of Φ.in         ⇒  target ∩ source
//!            Φ.rv n2 y (captured)         ⇒  target ∋ y
//! ```
//!
//! Invoking the single abstract method on a value known to be Φ inlines the
//! payload's summary directly (`inline`).

use super::shallow::receiver;
use crate::errors::{LinkError, Phase, Result};
use crate::features::linkage::domain::{Link, LinkNature};
use crate::features::linkage::infrastructure::TranslationMap;
use crate::features::linkage::ports::{HiddenContentProvider, TypeModel};
use crate::shared::models::{FunctionalPayload, MethodRef, Variable};

/// A payload's summary in the caller's terms
#[derive(Debug, Clone, Default)]
pub struct FunctionalView {
    /// Value produced by the payload
    pub output: Option<Variable>,
    pub output_links: Vec<Link>,
    /// First input of the payload: parameter 0, or the receiver of an unbound reference
    pub input: Option<Variable>,
    pub input_links: Vec<Link>,
}

impl FunctionalView {
    pub fn is_empty(&self) -> bool {
        self.output_links.is_empty() && self.input_links.is_empty()
    }
}

/// Payload summary inlined at an invocation of the single abstract method
#[derive(Debug, Default)]
pub struct Inlined {
    pub links: Vec<Link>,
    pub modified: Vec<Variable>,
}

pub struct FunctionalInterfaceLinker<'a> {
    model: &'a dyn TypeModel,
    hidden: &'a dyn HiddenContentProvider,
    method: &'a MethodRef,
}

impl<'a> FunctionalInterfaceLinker<'a> {
    pub fn new(
        model: &'a dyn TypeModel,
        hidden: &'a dyn HiddenContentProvider,
        method: &'a MethodRef,
    ) -> Self {
        Self {
            model,
            hidden,
            method,
        }
    }

    /// Translation of the payload's own variables: a bound reference maps the
    /// receiver to its scope, `arguments` map the inputs in order
    fn translation(&self, payload: &FunctionalPayload, arguments: &[Variable]) -> (TranslationMap<'a>, Option<Variable>) {
        let mut map = TranslationMap::new(self.hidden);
        let mut input = None;
        let Some(referenced) = self.model.method(&payload.method) else {
            return (map, input);
        };
        let mut args = arguments.iter();
        let this = receiver(self.model, &referenced).filter(|_| !referenced.is_lambda);
        match (this, &payload.scope) {
            (Some(this), Some(scope)) => map.put(&this, scope),
            (Some(this), None) => {
                input = Some(this.clone());
                if let Some(first) = args.next() {
                    map.put(&this, first);
                }
            }
            _ => {}
        }
        for p in referenced.parameter_variables() {
            if input.is_none() {
                input = Some(p.clone());
            }
            if let Some(a) = args.next() {
                map.put(&p, a);
            }
        }
        (map, input)
    }

    pub fn view(&self, payload: &FunctionalPayload) -> FunctionalView {
        let (map, input) = self.translation(payload, &[]);
        let summary = &payload.summary;
        let output = summary.of_return().map(|l| l.primary().clone());
        let output_links = summary
            .of_return()
            .map(|l| l.iter().map(|link| map.translate_link(link)).collect())
            .unwrap_or_default();
        let input_links = input
            .as_ref()
            .and_then(|i| i.parameter_index())
            .and_then(|i| summary.of_parameter(i))
            .map(|l| l.iter().map(|link| map.translate_link(link)).collect())
            .unwrap_or_default();
        FunctionalView {
            output,
            output_links,
            input: input.map(|i| map.translate(&i)),
            input_links,
        }
    }

    /// `x nature Φ` where Φ produces a value
    pub fn supplier(&self, x: &Variable, nature: &LinkNature, view: &FunctionalView) -> Vec<Link> {
        let Some(output) = &view.output else {
            return Vec::new();
        };
        splice(x, nature, output, &view.output_links)
    }

    /// `x nature Φ` where Φ receives values, typically `this.§ts ∋ Φ`
    pub fn consumer(&self, x: &Variable, nature: &LinkNature, view: &FunctionalView) -> Vec<Link> {
        let Some(input) = &view.input else {
            return Vec::new();
        };
        splice(x, nature, input, &view.input_links)
    }

    /// `target ⊆ Φ` where Φ maps the elements of `source` to those of `target`
    pub fn function(
        &self,
        target: &Variable,
        source: Option<&Variable>,
        view: &FunctionalView,
    ) -> Result<Vec<Link>> {
        if view.output_links.is_empty() {
            return Ok(Vec::new());
        }
        let Some(source) = source else {
            return Err(LinkError::unsupported(
                self.method,
                Phase::FunctionalInterface,
                format!("function applied to {} without a source container", target),
            ));
        };
        let mut result = Vec::new();
        for link in view.output_links.iter().filter(|l| Some(&l.from) == view.output.as_ref()) {
            let y = &link.to;
            let on_input = view.input.as_ref().filter(|i| y.is_part_of(i));
            let derived = match on_input {
                Some(input) if y == input && link.nature.is_identical_or_assigned() => {
                    Some(Link::new(target, LinkNature::IS_SUBSET_OF, source))
                }
                Some(input) if y == input && link.nature == LinkNature::IS_ELEMENT_OF => self
                    .one_dimension_less(source)
                    .map(|reduced| Link::new(target, LinkNature::SHARES_ELEMENTS, &reduced)),
                Some(_) => Some(Link::new(target, LinkNature::OBJECT_GRAPH_OVERLAPS, source)),
                None => Some(Link::new(target, LinkNature::CONTAINS_AS_MEMBER, y)),
            };
            if let Some(link) = derived {
                if !result.contains(&link) {
                    result.push(link);
                }
            }
        }
        Ok(result)
    }

    /// Invoke Φ's single abstract method with `arguments`, producing `result`
    pub fn inline(
        &self,
        payload: &FunctionalPayload,
        result: Option<&Variable>,
        arguments: &[Variable],
    ) -> Inlined {
        let (mut map, _) = self.translation(payload, arguments);
        let summary = &payload.summary;
        if let (Some(rv), Some(result)) = (summary.of_return(), result) {
            map.put(rv.primary(), result);
        }
        let mut inlined = Inlined::default();
        let returned = summary.of_return().filter(|_| result.is_some());
        for links in returned.into_iter().chain(summary.of_parameters()) {
            for link in links {
                let translated = map.translate_link(link);
                if translated.from != translated.to && !inlined.links.contains(&translated) {
                    inlined.links.push(translated);
                }
            }
        }
        inlined.modified = summary.modified().iter().map(|v| map.translate(v)).collect();
        inlined
    }

    /// `source`'s virtual field over the same storage with one array dimension less
    fn one_dimension_less(&self, source: &Variable) -> Option<Variable> {
        let field = source.field_ref()?;
        let arrays = source.ty().arrays;
        if arrays < 2 {
            return None;
        }
        let element = source.ty().clone().with_arrays(0);
        let reduced = self.hidden.virtual_field(&element, arrays - 1, &field.owner);
        Some(Variable::field(reduced, source.scope().cloned()))
    }
}

/// `x nature anchor` spliced with the anchor's own links
fn splice(x: &Variable, nature: &LinkNature, anchor: &Variable, links: &[Link]) -> Vec<Link> {
    let mut result = Vec::new();
    for link in links {
        let derived = if &link.from == anchor {
            let combined = nature.combine(&link.nature);
            combined.valid().then(|| Link::new(x, combined, &link.to))
        } else if nature.is_identical_or_assigned() {
            // parts of the anchor are parts of x
            Some(Link::new(&link.from.substitute(anchor, x), link.nature.clone(), &link.to))
        } else {
            None
        };
        if let Some(link) = derived.filter(|l| l.from != l.to) {
            if !result.contains(&link) {
                result.push(link);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::linkage::domain::{Links, MethodLinkedVariables};
    use crate::features::linkage::infrastructure::DefaultHiddenContent;
    use crate::shared::models::{MethodBuilder, ParameterizedType, Program, TypeInfo, TypeName};
    use std::sync::Arc;

    struct Fixture {
        model: Arc<dyn TypeModel>,
        hidden: DefaultHiddenContent,
        lambda: MethodRef,
        x: Variable,
        y: Variable,
        lambda_param: Variable,
        lambda_rv: Variable,
    }

    /// A lambda `a -> y` in `a.C`, where `y` is a local of the enclosing method
    fn fixture() -> Fixture {
        let c = TypeName::new("a.C");
        let ty = ParameterizedType::class(&c);
        let builder = MethodBuilder::new(&c, "lambda$0")
            .parameter("a", ty.clone())
            .returns(ty.clone())
            .lambda();
        let lambda_param = builder.parameter_variable(0);
        let lambda_rv = builder.return_variable();
        let lambda = builder.id();
        let mut program = Program::builder();
        program.add_type(TypeInfo::new("a.C")).add_method(builder.build());
        let model: Arc<dyn TypeModel> = Arc::new(program.build());
        let hidden = DefaultHiddenContent::new(model.clone());
        Fixture {
            model,
            hidden,
            lambda,
            x: Variable::local("x", ty.clone()),
            y: Variable::local("y", ty),
            lambda_param,
            lambda_rv,
        }
    }

    fn payload(f: &Fixture, rv: Links, param: Links) -> FunctionalPayload {
        FunctionalPayload {
            method: f.lambda.clone(),
            scope: None,
            summary: Arc::new(MethodLinkedVariables::new(Some(rv), vec![param])),
        }
    }

    #[test]
    fn test_supplier_splices_output() {
        let f = fixture();
        let p = payload(
            &f,
            Links::new(&f.lambda_rv).with(LinkNature::IS_ASSIGNED_FROM, &f.y),
            Links::new(&f.lambda_param),
        );
        let linker = FunctionalInterfaceLinker::new(&*f.model, &f.hidden, &f.lambda);
        let view = linker.view(&p);
        let links = linker.supplier(&f.x, &LinkNature::IS_ASSIGNED_FROM, &view);
        assert_eq!(links, vec![Link::new(&f.x, LinkNature::IS_ASSIGNED_FROM, &f.y)]);
    }

    #[test]
    fn test_consumer_splices_input() {
        let f = fixture();
        let p = payload(
            &f,
            Links::new(&f.lambda_rv),
            Links::new(&f.lambda_param).with(LinkNature::IS_ELEMENT_OF, &f.y),
        );
        let linker = FunctionalInterfaceLinker::new(&*f.model, &f.hidden, &f.lambda);
        let view = linker.view(&p);
        let links = linker.consumer(&f.x, &LinkNature::CONTAINS_AS_MEMBER, &view);
        assert_eq!(links, vec![Link::new(&f.x, LinkNature::SHARES_ELEMENTS, &f.y)]);
    }

    #[test]
    fn test_function_identity_is_subset() {
        let f = fixture();
        let p = payload(
            &f,
            Links::new(&f.lambda_rv).with(LinkNature::IS_ASSIGNED_FROM, &f.lambda_param),
            Links::new(&f.lambda_param),
        );
        let linker = FunctionalInterfaceLinker::new(&*f.model, &f.hidden, &f.lambda);
        let view = linker.view(&p);
        let links = linker.function(&f.x, Some(&f.y), &view).unwrap();
        assert_eq!(links, vec![Link::new(&f.x, LinkNature::IS_SUBSET_OF, &f.y)]);
    }

    /// `y.§<n dims>` over `a.C` values
    fn hidden_of_y(f: &Fixture, arrays: u32) -> Variable {
        let c = TypeName::new("a.C");
        let field = f.hidden.virtual_field(&ParameterizedType::class(&c), arrays, &c);
        Variable::field(field, Some(f.y.clone()))
    }

    #[test]
    fn test_function_element_shares_one_dimension_less() {
        let f = fixture();
        let p = payload(
            &f,
            Links::new(&f.lambda_rv).with(LinkNature::IS_ELEMENT_OF, &f.lambda_param),
            Links::new(&f.lambda_param),
        );
        let linker = FunctionalInterfaceLinker::new(&*f.model, &f.hidden, &f.lambda);
        let view = linker.view(&p);
        let source = hidden_of_y(&f, 2);
        let links = linker.function(&f.x, Some(&source), &view).unwrap();

        let reduced = hidden_of_y(&f, 1);
        assert_eq!(reduced.ty().arrays, 1);
        assert_eq!(links, vec![Link::new(&f.x, LinkNature::SHARES_ELEMENTS, &reduced)]);
    }

    #[test]
    fn test_function_element_needs_two_dimensions() {
        let f = fixture();
        let p = payload(
            &f,
            Links::new(&f.lambda_rv).with(LinkNature::IS_ELEMENT_OF, &f.lambda_param),
            Links::new(&f.lambda_param),
        );
        let linker = FunctionalInterfaceLinker::new(&*f.model, &f.hidden, &f.lambda);
        assert!(linker.one_dimension_less(&hidden_of_y(&f, 1)).is_none());
        assert!(linker.one_dimension_less(&f.y).is_none());

        let view = linker.view(&p);
        let links = linker.function(&f.x, Some(&hidden_of_y(&f, 1)), &view).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_function_without_source_is_unsupported() {
        let f = fixture();
        let p = payload(
            &f,
            Links::new(&f.lambda_rv).with(LinkNature::IS_ASSIGNED_FROM, &f.y),
            Links::new(&f.lambda_param),
        );
        let linker = FunctionalInterfaceLinker::new(&*f.model, &f.hidden, &f.lambda);
        let view = linker.view(&p);
        let err = linker.function(&f.x, None, &view).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_inline_maps_inputs_to_arguments() {
        let f = fixture();
        let p = payload(
            &f,
            Links::new(&f.lambda_rv).with(LinkNature::IS_ASSIGNED_FROM, &f.lambda_param),
            Links::new(&f.lambda_param),
        );
        let linker = FunctionalInterfaceLinker::new(&*f.model, &f.hidden, &f.lambda);
        let inlined = linker.inline(&p, Some(&f.x), &[f.y.clone()]);
        assert_eq!(inlined.links, vec![Link::new(&f.x, LinkNature::IS_ASSIGNED_FROM, &f.y)]);
    }
}
