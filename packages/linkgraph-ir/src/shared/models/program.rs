//! Program registry: types, methods and externally declared method facts
//!
//! # Usage
//!
//! ```text
//! let mut builder = ProgramBuilder::new();
//! let c = TypeInfo::new("a.C").type_parameter("T");
//! let t = c.tp("T").unwrap();
//! builder.add_type(c.field("ts", ParameterizedType::type_parameter(&t).with_arrays(1)));
//! let get = MethodBuilder::new(&TypeName::new("a.C"), "get").parameter("i", ParameterizedType::int());
//! builder.add_method(get.returns(...).body(...).build());
//! let program = builder.build();
//! ```

use super::expression::Block;
use super::types::{FieldInfo, FieldRef, MethodRef, ParameterizedType, TypeName, TypeParameter};
use super::variable::Variable;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Slot number of the return value in an independence link map
pub const RETURN_SLOT: i32 = -1;

// ═══════════════════════════════════════════════════════════════════════════
// Declared facts
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndependenceLevel {
    /// Shares mutable structure
    #[default]
    Dependent,
    /// Shares only hidden content (the elements), not the container itself
    IndependentHc,
    Independent,
}

/// Independence of a parameter (or of the return value w.r.t. the receiver).
/// `links` maps another slot (parameter index, or `RETURN_SLOT`) to the nesting
/// level at which hidden content flows into it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Independence {
    pub level: IndependenceLevel,
    pub links: BTreeMap<i32, u8>,
}

impl Independence {
    pub fn independent() -> Self {
        Self {
            level: IndependenceLevel::Independent,
            links: BTreeMap::new(),
        }
    }

    pub fn independent_hc() -> Self {
        Self {
            level: IndependenceLevel::IndependentHc,
            links: BTreeMap::new(),
        }
    }

    pub fn dependent() -> Self {
        Self::default()
    }

    /// Builder: hidden content flows into `slot` at `level`
    pub fn with_link(mut self, slot: i32, level: u8) -> Self {
        self.links.insert(slot, level);
        self
    }

    pub fn is_independent(&self) -> bool {
        self.level == IndependenceLevel::Independent && self.links.is_empty()
    }

    pub fn link_level(&self, slot: i32) -> Option<u8> {
        self.links.get(&slot).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterFacts {
    pub modified: bool,
    pub independence: Independence,
}

#[derive(Debug, Clone, Default)]
pub struct MethodFacts {
    pub modifying: bool,
    /// Returns its first parameter
    pub identity: bool,
    /// Return value w.r.t. the receiver
    pub independence: Independence,
    pub parameters: Vec<ParameterFacts>,
}

impl MethodFacts {
    pub fn modifying(mut self, v: bool) -> Self {
        self.modifying = v;
        self
    }

    pub fn identity(mut self, v: bool) -> Self {
        self.identity = v;
        self
    }

    pub fn independence(mut self, v: Independence) -> Self {
        self.independence = v;
        self
    }

    pub fn parameter(mut self, index: usize, facts: ParameterFacts) -> Self {
        if self.parameters.len() <= index {
            self.parameters.resize(index + 1, ParameterFacts::default());
        }
        self.parameters[index] = facts;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Methods
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub name: Arc<str>,
    pub index: usize,
    pub ty: ParameterizedType,
    pub varargs: bool,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub id: MethodRef,
    pub name: Arc<str>,
    pub owner: TypeName,
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: ParameterizedType,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_constructor: bool,
    /// Synthetic method holding a lambda body
    pub is_lambda: bool,
    pub body: Option<Block>,
    pub facts: MethodFacts,
}

impl MethodInfo {
    pub fn parameter_variable(&self, index: usize) -> Option<Variable> {
        self.parameters
            .get(index)
            .map(|p| Variable::parameter(&self.id, p.index, &p.name, p.ty.clone()))
    }

    pub fn parameter_variables(&self) -> Vec<Variable> {
        (0..self.parameters.len())
            .filter_map(|i| self.parameter_variable(i))
            .collect()
    }

    /// `None` for constructors and void methods
    pub fn return_variable(&self) -> Option<Variable> {
        if self.is_constructor || self.return_type.is_void() {
            None
        } else {
            Some(Variable::return_value(&self.id, self.return_type.clone()))
        }
    }

    pub fn has_source(&self) -> bool {
        self.body.is_some()
    }

    pub fn parameter_facts(&self, index: usize) -> ParameterFacts {
        self.facts
            .parameters
            .get(index)
            .cloned()
            .unwrap_or_default()
    }
}

/// Builder for `MethodInfo`; the method id is derived from owner, name and parameter types
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    owner: TypeName,
    name: String,
    type_parameters: Vec<TypeParameter>,
    parameters: Vec<ParameterInfo>,
    return_type: ParameterizedType,
    is_static: bool,
    is_abstract: bool,
    is_constructor: bool,
    is_lambda: bool,
    body: Option<Block>,
    facts: MethodFacts,
}

impl MethodBuilder {
    pub fn new(owner: &TypeName, name: &str) -> Self {
        Self {
            owner: owner.clone(),
            name: name.to_string(),
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: ParameterizedType::void(),
            is_static: false,
            is_abstract: false,
            is_constructor: false,
            is_lambda: false,
            body: None,
            facts: MethodFacts::default(),
        }
    }

    pub fn constructor(owner: &TypeName) -> Self {
        let mut builder = Self::new(owner, "<init>");
        builder.is_constructor = true;
        builder
    }

    /// Type parameter owned by this method
    pub fn method_type_parameter(&self, name: &str) -> TypeParameter {
        let owner = MethodRef::new(format!("{}.{}", self.owner, self.name));
        let index = self
            .type_parameters
            .iter()
            .position(|tp| &*tp.name == name)
            .unwrap_or(self.type_parameters.len()) as u32;
        TypeParameter::of_method(&owner, index, name)
    }

    pub fn type_parameter(mut self, name: &str) -> Self {
        let tp = self.method_type_parameter(name);
        if !self.type_parameters.contains(&tp) {
            self.type_parameters.push(tp);
        }
        self
    }

    pub fn parameter(mut self, name: &str, ty: ParameterizedType) -> Self {
        let index = self.parameters.len();
        self.parameters.push(ParameterInfo {
            name: Arc::from(name),
            index,
            ty,
            varargs: false,
        });
        self
    }

    /// Variable-arity parameter; `ty` is the array type
    pub fn varargs(mut self, name: &str, ty: ParameterizedType) -> Self {
        let index = self.parameters.len();
        self.parameters.push(ParameterInfo {
            name: Arc::from(name),
            index,
            ty,
            varargs: true,
        });
        self
    }

    pub fn returns(mut self, ty: ParameterizedType) -> Self {
        self.return_type = ty;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn abstract_method(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn lambda(mut self) -> Self {
        self.is_lambda = true;
        self
    }

    pub fn facts(mut self, facts: MethodFacts) -> Self {
        self.facts = facts;
        self
    }

    pub fn body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    pub fn id(&self) -> MethodRef {
        let params: Vec<String> = self.parameters.iter().map(|p| p.ty.to_string()).collect();
        MethodRef::new(format!("{}.{}({})", self.owner, self.name, params.join(",")))
    }

    pub fn parameter_variable(&self, index: usize) -> Variable {
        let p = &self.parameters[index];
        Variable::parameter(&self.id(), index, &p.name, p.ty.clone())
    }

    pub fn return_variable(&self) -> Variable {
        Variable::return_value(&self.id(), self.return_type.clone())
    }

    pub fn build(self) -> MethodInfo {
        let id = self.id();
        MethodInfo {
            id,
            name: Arc::from(self.name.as_str()),
            owner: self.owner,
            type_parameters: self.type_parameters,
            parameters: self.parameters,
            return_type: self.return_type,
            is_static: self.is_static,
            is_abstract: self.is_abstract,
            is_constructor: self.is_constructor,
            is_lambda: self.is_lambda,
            body: self.body,
            facts: self.facts,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: TypeName,
    pub type_parameters: Vec<TypeParameter>,
    pub fields: Vec<FieldRef>,
    pub methods: Vec<MethodRef>,
    pub super_types: Vec<TypeName>,
    pub mutable: bool,
    /// Pre-compiled: methods are analyzed shallowly
    pub external: bool,
    /// 0: no hidden content, 1: a single element (Optional), 2: many (List)
    pub hidden_content_multiplicity: u32,
    /// Single abstract method of a functional interface
    pub functional_method: Option<MethodRef>,
}

impl TypeInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: TypeName::new(name),
            type_parameters: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_types: Vec::new(),
            mutable: false,
            external: false,
            hidden_content_multiplicity: 0,
            functional_method: None,
        }
    }

    pub fn type_parameter(mut self, name: &str) -> Self {
        let index = self.type_parameters.len() as u32;
        self.type_parameters
            .push(TypeParameter::of_type(&self.name, index, name));
        self
    }

    pub fn field(mut self, name: &str, ty: ParameterizedType) -> Self {
        self.fields.push(Arc::new(FieldInfo::new(&self.name, name, ty)));
        self
    }

    pub fn static_field(mut self, name: &str, ty: ParameterizedType) -> Self {
        self.fields
            .push(Arc::new(FieldInfo::new_static(&self.name, name, ty)));
        self
    }

    pub fn super_type(mut self, name: &TypeName) -> Self {
        self.super_types.push(name.clone());
        self
    }

    pub fn mutable(mut self, v: bool) -> Self {
        self.mutable = v;
        self
    }

    pub fn external(mut self, v: bool) -> Self {
        self.external = v;
        self
    }

    pub fn multiplicity(mut self, v: u32) -> Self {
        self.hidden_content_multiplicity = v;
        self
    }

    pub fn functional(mut self, sam: &MethodRef) -> Self {
        self.functional_method = Some(sam.clone());
        self
    }

    pub fn tp(&self, name: &str) -> Option<TypeParameter> {
        self.type_parameters
            .iter()
            .find(|tp| &*tp.name == name)
            .cloned()
    }

    pub fn field_named(&self, name: &str) -> Option<FieldRef> {
        self.fields.iter().find(|f| &*f.name == name).cloned()
    }

    /// The type parameterized by its own type parameters, e.g. `List<E>`
    pub fn this_type(&self) -> ParameterizedType {
        ParameterizedType::generic(
            &self.name,
            self.type_parameters
                .iter()
                .map(ParameterizedType::type_parameter)
                .collect(),
        )
    }

    pub fn this_variable(&self) -> Variable {
        Variable::this(&self.name, self.this_type())
    }

    /// `this.<field>`
    pub fn field_variable(&self, name: &str) -> Option<Variable> {
        self.field_named(name)
            .map(|f| Variable::field(f, Some(self.this_variable())))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Program
// ═══════════════════════════════════════════════════════════════════════════

/// Read-only program model
#[derive(Debug, Default)]
pub struct Program {
    types: FxHashMap<TypeName, Arc<TypeInfo>>,
    methods: FxHashMap<MethodRef, Arc<MethodInfo>>,
}

impl Program {
    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::new()
    }

    pub fn type_info(&self, name: &TypeName) -> Option<&Arc<TypeInfo>> {
        self.types.get(name)
    }

    pub fn method(&self, id: &MethodRef) -> Option<&Arc<MethodInfo>> {
        self.methods.get(id)
    }

    /// Type names in sorted order
    pub fn type_names(&self) -> Vec<TypeName> {
        let mut names: Vec<TypeName> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Methods declared in `name`, in declaration order
    pub fn methods_of(&self, name: &TypeName) -> Vec<Arc<MethodInfo>> {
        self.types
            .get(name)
            .map(|t| {
                t.methods
                    .iter()
                    .filter_map(|m| self.methods.get(m).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    types: Vec<TypeInfo>,
    methods: Vec<MethodInfo>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, ty: TypeInfo) -> &mut Self {
        self.types.push(ty);
        self
    }

    pub fn add_method(&mut self, method: MethodInfo) -> &mut Self {
        self.methods.push(method);
        self
    }

    /// Attach methods to their owners and freeze
    pub fn build(self) -> Program {
        let mut types: FxHashMap<TypeName, TypeInfo> = FxHashMap::default();
        for ty in self.types {
            types.insert(ty.name.clone(), ty);
        }
        let mut methods = FxHashMap::default();
        for method in self.methods {
            if let Some(owner) = types.get_mut(&method.owner) {
                if !owner.methods.contains(&method.id) {
                    owner.methods.push(method.id.clone());
                }
            }
            methods.insert(method.id.clone(), Arc::new(method));
        }
        Program {
            types: types.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
            methods,
        }
    }
}
