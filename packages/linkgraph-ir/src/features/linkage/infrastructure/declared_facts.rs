//! `MethodFactProvider` reading the facts declared on each method

use crate::features::linkage::ports::MethodFactProvider;
use crate::shared::models::{Independence, MethodInfo};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredFacts;

impl MethodFactProvider for DeclaredFacts {
    fn independence_of_method(&self, method: &MethodInfo) -> Independence {
        method.facts.independence.clone()
    }

    fn independence_of_parameter(&self, method: &MethodInfo, index: usize) -> Independence {
        method.parameter_facts(index).independence
    }

    fn is_modifying(&self, method: &MethodInfo) -> bool {
        method.facts.modifying
    }

    fn is_parameter_modified(&self, method: &MethodInfo, index: usize) -> bool {
        method.parameter_facts(index).modified
    }

    fn is_identity(&self, method: &MethodInfo) -> bool {
        method.facts.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{
        MethodBuilder, MethodFacts, ParameterFacts, ParameterizedType, TypeName,
    };

    #[test]
    fn test_reads_declared_facts() {
        let c = TypeName::new("a.C");
        let method = MethodBuilder::new(&c, "add")
            .parameter("x", ParameterizedType::class(&c))
            .facts(MethodFacts::default().modifying(true).parameter(
                0,
                ParameterFacts {
                    modified: false,
                    independence: Independence::independent_hc(),
                },
            ))
            .build();
        let facts = DeclaredFacts;
        assert!(facts.is_modifying(&method));
        assert!(!facts.is_pure(&method));
        assert_eq!(
            facts.independence_of_parameter(&method, 0),
            Independence::independent_hc()
        );
        // undeclared parameters default to dependent
        assert_eq!(facts.independence_of_parameter(&method, 3), Independence::dependent());
    }
}
