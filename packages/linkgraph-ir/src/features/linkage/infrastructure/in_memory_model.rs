//! `TypeModel` over the in-memory `Program`

use crate::features::linkage::ports::TypeModel;
use crate::shared::models::{MethodInfo, MethodRef, Program, TypeInfo, TypeName};
use rustc_hash::FxHashSet;
use std::sync::Arc;

impl TypeModel for Program {
    fn type_info(&self, name: &TypeName) -> Option<Arc<TypeInfo>> {
        Program::type_info(self, name).cloned()
    }

    fn method(&self, id: &MethodRef) -> Option<Arc<MethodInfo>> {
        Program::method(self, id).cloned()
    }

    fn methods_of(&self, name: &TypeName) -> Vec<Arc<MethodInfo>> {
        Program::methods_of(self, name)
    }

    fn super_types(&self, name: &TypeName) -> Vec<TypeName> {
        let mut result = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![name.clone()];
        while let Some(current) = stack.pop() {
            let Some(info) = Program::type_info(self, &current) else {
                continue;
            };
            for s in &info.super_types {
                if s != name && seen.insert(s.clone()) {
                    result.push(s.clone());
                    stack.push(s.clone());
                }
            }
        }
        result
    }
}
