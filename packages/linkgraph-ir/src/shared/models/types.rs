//! Type model: names, parameterized types, fields
//!
//! Types are compared structurally. Type parameters carry their owner so that
//! `List.E` and `ArrayList.E` never collide during substitution.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Fully qualified type name, e.g. `java.util.List`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Method identity: owner, name and erased parameter types, e.g. `a.B.get(int)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef(Arc<str>);

impl MethodRef {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Method name without owner and signature
    pub fn simple_name(&self) -> &str {
        let head = self.0.split('(').next().unwrap_or(&self.0);
        head.rsplit('.').next().unwrap_or(head)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Int,
    Long,
    Double,
    Char,
    Void,
    /// Immutable string values never carry linkage
    String,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Double => "double",
            Primitive::Char => "char",
            Primitive::Void => "void",
            Primitive::String => "String",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeParameterOwner {
    Type(TypeName),
    Method(MethodRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParameter {
    pub name: Arc<str>,
    pub index: u32,
    pub owner: TypeParameterOwner,
}

impl TypeParameter {
    pub fn of_type(owner: &TypeName, index: u32, name: &str) -> Self {
        Self {
            name: Arc::from(name),
            index,
            owner: TypeParameterOwner::Type(owner.clone()),
        }
    }

    pub fn of_method(owner: &MethodRef, index: u32, name: &str) -> Self {
        Self {
            name: Arc::from(name),
            index,
            owner: TypeParameterOwner::Method(owner.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeBase {
    Primitive(Primitive),
    Class(TypeName),
    TypeParameter(TypeParameter),
    /// Synthetic record with one component per type parameter of a multi-parameter container
    Tuple(Arc<[ParameterizedType]>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterizedType {
    pub base: TypeBase,
    pub parameters: Vec<ParameterizedType>,
    pub arrays: u32,
}

impl ParameterizedType {
    pub fn primitive(p: Primitive) -> Self {
        Self {
            base: TypeBase::Primitive(p),
            parameters: Vec::new(),
            arrays: 0,
        }
    }

    pub fn int() -> Self {
        Self::primitive(Primitive::Int)
    }

    pub fn boolean() -> Self {
        Self::primitive(Primitive::Boolean)
    }

    pub fn void() -> Self {
        Self::primitive(Primitive::Void)
    }

    pub fn string() -> Self {
        Self::primitive(Primitive::String)
    }

    pub fn class(name: &TypeName) -> Self {
        Self {
            base: TypeBase::Class(name.clone()),
            parameters: Vec::new(),
            arrays: 0,
        }
    }

    pub fn generic(name: &TypeName, parameters: Vec<ParameterizedType>) -> Self {
        Self {
            base: TypeBase::Class(name.clone()),
            parameters,
            arrays: 0,
        }
    }

    pub fn type_parameter(tp: &TypeParameter) -> Self {
        Self {
            base: TypeBase::TypeParameter(tp.clone()),
            parameters: Vec::new(),
            arrays: 0,
        }
    }

    pub fn tuple(components: Vec<ParameterizedType>) -> Self {
        Self {
            base: TypeBase::Tuple(components.into()),
            parameters: Vec::new(),
            arrays: 0,
        }
    }

    /// Builder: set array dimensions
    pub fn with_arrays(mut self, arrays: u32) -> Self {
        self.arrays = arrays;
        self
    }

    pub fn copy_with_one_fewer_arrays(&self) -> Self {
        let mut copy = self.clone();
        copy.arrays = copy.arrays.saturating_sub(1);
        copy
    }

    pub fn is_void(&self) -> bool {
        self.arrays == 0 && matches!(self.base, TypeBase::Primitive(Primitive::Void))
    }

    /// Primitives and strings can never be linked
    pub fn is_primitive_or_string(&self) -> bool {
        self.arrays == 0 && matches!(self.base, TypeBase::Primitive(_))
    }

    pub fn type_name(&self) -> Option<&TypeName> {
        match &self.base {
            TypeBase::Class(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_type_parameter(&self) -> Option<&TypeParameter> {
        match &self.base {
            TypeBase::TypeParameter(tp) => Some(tp),
            _ => None,
        }
    }

    pub fn tuple_components(&self) -> Option<&[ParameterizedType]> {
        match &self.base {
            TypeBase::Tuple(components) => Some(components),
            _ => None,
        }
    }

    /// Collect every type parameter occurring anywhere in this type
    pub fn extract_type_parameters(&self, out: &mut BTreeSet<TypeParameter>) {
        match &self.base {
            TypeBase::TypeParameter(tp) => {
                out.insert(tp.clone());
            }
            TypeBase::Tuple(components) => {
                for c in components.iter() {
                    c.extract_type_parameters(out);
                }
            }
            _ => {}
        }
        for p in &self.parameters {
            p.extract_type_parameters(out);
        }
    }

    /// Replace type parameters by concrete types; array dimensions add up
    pub fn substitute(&self, map: &FxHashMap<TypeParameter, ParameterizedType>) -> Self {
        let parameters = self.parameters.iter().map(|p| p.substitute(map)).collect();
        match &self.base {
            TypeBase::TypeParameter(tp) => match map.get(tp) {
                Some(concrete) => {
                    let mut result = concrete.clone();
                    result.arrays += self.arrays;
                    result
                }
                None => Self {
                    base: self.base.clone(),
                    parameters,
                    arrays: self.arrays,
                },
            },
            TypeBase::Tuple(components) => Self {
                base: TypeBase::Tuple(components.iter().map(|c| c.substitute(map)).collect()),
                parameters,
                arrays: self.arrays,
            },
            _ => Self {
                base: self.base.clone(),
                parameters,
                arrays: self.arrays,
            },
        }
    }
}

impl fmt::Display for ParameterizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            TypeBase::Primitive(p) => f.write_str(p.as_str())?,
            TypeBase::Class(name) => f.write_str(name.simple_name())?,
            TypeBase::TypeParameter(tp) => f.write_str(&tp.name)?,
            TypeBase::Tuple(components) => {
                f.write_str("(")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str(")")?;
            }
        }
        if !self.parameters.is_empty() {
            f.write_str("<")?;
            for (i, p) in self.parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", p)?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.arrays {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Kind of a synthetic field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VirtualKind {
    /// `§m`: stands for "this object was mutated"
    Mutation,
    /// `§ts`, `§kvs`, ...: erased element storage of a container
    HiddenContent,
    /// One component of a tuple-typed hidden content, by position
    Component(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: Arc<str>,
    pub owner: TypeName,
    pub ty: ParameterizedType,
    pub is_static: bool,
    pub virtual_kind: Option<VirtualKind>,
}

pub type FieldRef = Arc<FieldInfo>;

impl FieldInfo {
    pub fn new(owner: &TypeName, name: &str, ty: ParameterizedType) -> Self {
        Self {
            name: Arc::from(name),
            owner: owner.clone(),
            ty,
            is_static: false,
            virtual_kind: None,
        }
    }

    pub fn new_static(owner: &TypeName, name: &str, ty: ParameterizedType) -> Self {
        Self {
            is_static: true,
            ..Self::new(owner, name, ty)
        }
    }

    pub fn new_virtual(
        owner: &TypeName,
        name: &str,
        ty: ParameterizedType,
        kind: VirtualKind,
    ) -> Self {
        Self {
            virtual_kind: Some(kind),
            ..Self::new(owner, name, ty)
        }
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_kind.is_some()
    }

    pub fn is_mutation_marker(&self) -> bool {
        self.virtual_kind == Some(VirtualKind::Mutation)
    }
}
