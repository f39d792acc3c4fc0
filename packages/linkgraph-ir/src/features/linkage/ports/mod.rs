//! Ports: the oracles the engine consumes
//!
//! - `TypeModel`: types, methods, supertypes, mutability
//! - `HiddenContentProvider`: synthetic fields for erased generic storage
//! - `MethodFactProvider`: declared independence / modification facts

use crate::shared::models::{
    FieldRef, Independence, MethodInfo, MethodRef, ParameterizedType, TypeInfo, TypeName,
    TypeParameter,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub trait TypeModel: Send + Sync {
    fn type_info(&self, name: &TypeName) -> Option<Arc<TypeInfo>>;

    fn method(&self, id: &MethodRef) -> Option<Arc<MethodInfo>>;

    /// Methods declared in `name`, in declaration order
    fn methods_of(&self, name: &TypeName) -> Vec<Arc<MethodInfo>>;

    /// All supertypes, transitively, without `name` itself
    fn super_types(&self, name: &TypeName) -> Vec<TypeName>;

    /// Arrays are always mutable; primitives and type parameters never are
    fn is_mutable(&self, ty: &ParameterizedType) -> bool {
        if ty.arrays > 0 {
            return true;
        }
        ty.type_name()
            .and_then(|n| self.type_info(n))
            .map_or(false, |t| t.mutable)
    }

    /// The single abstract method of a functional interface type
    fn single_abstract_method(&self, ty: &ParameterizedType) -> Option<Arc<MethodInfo>> {
        if ty.arrays > 0 {
            return None;
        }
        let info = self.type_info(ty.type_name()?)?;
        let sam = info.functional_method.as_ref()?;
        self.method(sam)
    }

    /// Map from the declared type parameters of `ty`'s type to its actual arguments
    fn type_arguments(&self, ty: &ParameterizedType) -> FxHashMap<TypeParameter, ParameterizedType> {
        let mut map = FxHashMap::default();
        if let Some(info) = ty.type_name().and_then(|n| self.type_info(n)) {
            for (tp, arg) in info.type_parameters.iter().zip(ty.parameters.iter()) {
                map.insert(tp.clone(), arg.clone());
            }
        }
        map
    }

    fn substitute(
        &self,
        ty: &ParameterizedType,
        map: &FxHashMap<TypeParameter, ParameterizedType>,
    ) -> ParameterizedType {
        ty.substitute(map)
    }

    /// External types are pre-compiled; their methods are analyzed shallowly
    fn is_external(&self, name: &TypeName) -> bool {
        self.type_info(name).map_or(true, |t| t.external)
    }
}

/// Synthetic fields of one type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFields {
    /// `§m`, present for mutable types
    pub mutation: Option<FieldRef>,
    /// `§ts`, `§kvs`, ...: present for types with hidden content
    pub hidden_content: Option<FieldRef>,
}

impl VirtualFields {
    pub const NONE: VirtualFields = VirtualFields {
        mutation: None,
        hidden_content: None,
    };
}

pub trait HiddenContentProvider: Send + Sync {
    fn virtual_fields(&self, ty: &ParameterizedType) -> VirtualFields;

    /// Component fields of a tuple type, one per component
    fn components(&self, ty: &ParameterizedType) -> Vec<FieldRef>;

    /// The field playing the role of `field` in a scope of type `scope_ty`
    fn retarget(&self, field: &FieldRef, scope_ty: &ParameterizedType) -> FieldRef;

    /// Hidden content holding `element` values with `arrays` extra dimensions
    fn virtual_field(&self, element: &ParameterizedType, arrays: u32, owner: &TypeName) -> FieldRef;

    fn mutation_field(&self, ty: &ParameterizedType) -> Option<FieldRef> {
        self.virtual_fields(ty).mutation
    }

    fn hidden_content(&self, ty: &ParameterizedType) -> Option<FieldRef> {
        self.virtual_fields(ty).hidden_content
    }
}

pub trait MethodFactProvider: Send + Sync {
    /// Independence of the return value with respect to the receiver
    fn independence_of_method(&self, method: &MethodInfo) -> Independence;

    fn independence_of_parameter(&self, method: &MethodInfo, index: usize) -> Independence;

    fn is_modifying(&self, method: &MethodInfo) -> bool;

    fn is_parameter_modified(&self, method: &MethodInfo, index: usize) -> bool;

    /// Returns its first parameter unchanged
    fn is_identity(&self, method: &MethodInfo) -> bool;

    fn is_pure(&self, method: &MethodInfo) -> bool {
        !self.is_modifying(method)
            && (0..method.parameters.len()).all(|i| !self.is_parameter_modified(method, i))
    }
}
