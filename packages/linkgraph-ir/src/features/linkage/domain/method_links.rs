//! Per-method summary

use super::link::{Link, Links};
use super::link_nature::LinkNature;
use crate::shared::models::{MethodInfo, Variable};
use std::collections::BTreeSet;
use std::fmt;

/// What a method does to linkage: links of the return value, links of each
/// parameter (positional), and the variables it modifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodLinkedVariables {
    of_return: Option<Links>,
    of_parameters: Vec<Links>,
    modified: BTreeSet<Variable>,
}

impl MethodLinkedVariables {
    pub fn new(of_return: Option<Links>, of_parameters: Vec<Links>) -> Self {
        Self {
            of_return,
            of_parameters,
            modified: BTreeSet::new(),
        }
    }

    /// Builder: set the modified variables
    pub fn with_modified(mut self, modified: BTreeSet<Variable>) -> Self {
        self.modified = modified;
        self
    }

    /// Nothing known: links nothing, modifies nothing
    pub fn empty(method: &MethodInfo) -> Self {
        Self::new(
            method.return_variable().map(|rv| Links::new(&rv)),
            method
                .parameter_variables()
                .iter()
                .map(Links::new)
                .collect(),
        )
    }

    /// Maximally pessimistic summary for a method whose analysis failed:
    /// the return value and every parameter overlap the receiver and each
    /// other, and every non-primitive input is modified.
    pub fn conservative(method: &MethodInfo, this: Option<&Variable>) -> Self {
        let params: Vec<Variable> = method
            .parameter_variables()
            .into_iter()
            .filter(|p| !p.ty().is_primitive_or_string())
            .collect();
        let overlap = LinkNature::OBJECT_GRAPH_OVERLAPS;

        let of_return = method.return_variable().map(|rv| {
            let mut links = Links::new(&rv);
            if !rv.ty().is_primitive_or_string() {
                if let Some(this) = this {
                    links.push(Link::new(&rv, overlap.clone(), this));
                }
                for p in &params {
                    links.push(Link::new(&rv, overlap.clone(), p));
                }
            }
            links
        });

        let of_parameters = method
            .parameter_variables()
            .iter()
            .map(|p| {
                let mut links = Links::new(p);
                if !p.ty().is_primitive_or_string() {
                    if let Some(this) = this {
                        links.push(Link::new(p, overlap.clone(), this));
                    }
                    for other in params.iter().filter(|o| *o != p) {
                        links.push(Link::new(p, overlap.clone(), other));
                    }
                }
                links
            })
            .collect();

        let mut modified: BTreeSet<Variable> = params.into_iter().collect();
        if let Some(this) = this {
            modified.insert(this.clone());
        }
        Self {
            of_return,
            of_parameters,
            modified,
        }
    }

    pub fn of_return(&self) -> Option<&Links> {
        self.of_return.as_ref()
    }

    pub fn of_parameters(&self) -> &[Links] {
        &self.of_parameters
    }

    pub fn of_parameter(&self, index: usize) -> Option<&Links> {
        self.of_parameters.get(index)
    }

    pub fn modified(&self) -> &BTreeSet<Variable> {
        &self.modified
    }

    pub fn is_modifying(&self) -> bool {
        !self.modified.is_empty()
    }

    /// True when neither the return value nor any parameter has links
    pub fn is_empty(&self) -> bool {
        self.of_return.as_ref().map_or(true, |l| l.is_empty())
            && self.of_parameters.iter().all(|l| l.is_empty())
    }
}

impl fmt::Display for MethodLinkedVariables {
    /// `[param0; param1] --> return`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, p) in self.of_parameters.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", p)?;
        }
        f.write_str("] --> ")?;
        match &self.of_return {
            Some(rv) => write!(f, "{}", rv),
            None => f.write_str("-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{MethodBuilder, ParameterizedType, TypeName};

    #[test]
    fn test_display() {
        let c = TypeName::new("a.C");
        let builder = MethodBuilder::new(&c, "id")
            .parameter("t", ParameterizedType::class(&c))
            .returns(ParameterizedType::class(&c));
        let p = builder.parameter_variable(0);
        let method = builder.build();
        let rv = method.return_variable().unwrap();
        let mlv = MethodLinkedVariables::new(
            Some(Links::new(&rv).with(LinkNature::IS_ASSIGNED_FROM, &p)),
            vec![Links::new(&p)],
        );
        assert_eq!(mlv.to_string(), "[-] --> ←0:t");
        assert!(!mlv.is_empty());
        assert!(MethodLinkedVariables::empty(&method).is_empty());
    }

    #[test]
    fn test_conservative_overlaps_everything() {
        let c = TypeName::new("a.C");
        let method = MethodBuilder::new(&c, "m")
            .parameter("x", ParameterizedType::class(&c))
            .parameter("i", ParameterizedType::int())
            .returns(ParameterizedType::class(&c))
            .build();
        let this = Variable::this(&c, ParameterizedType::class(&c));
        let mlv = MethodLinkedVariables::conservative(&method, Some(&this));
        assert_eq!(mlv.of_return().map(|l| l.len()), Some(2));
        assert!(mlv.of_parameter(1).map_or(false, |l| l.is_empty()));
        assert_eq!(mlv.modified().len(), 2);
    }
}
