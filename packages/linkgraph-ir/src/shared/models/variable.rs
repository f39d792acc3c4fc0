//! Variables: the locations linkage is computed between
//!
//! `Variable` is a cheap-to-clone handle over an immutable, sealed `VariableKind`.
//! Two identities are precomputed at construction:
//! - `key()`: structural identity, used for `Eq`, `Hash` and `Ord`
//! - `canonical_key()`: graph-vertex identity; virtual fields are keyed by their
//!   synthetic name only, so it is coarser than `key()`
//!
//! # Display
//!
//! ```text
//! 0:in          parameter 0 named `in`
//! ts            field `ts` of `this`
//! in.§ts        hidden content of parameter `in`
//! ts[0:i]       element of `ts` at the index held by parameter 0
//! §kvs[-1]      first-component slice of a map's hidden content
//! ```

use super::types::{FieldRef, MethodRef, ParameterizedType, TypeName, VirtualKind};
use crate::features::linkage::domain::MethodLinkedVariables;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Clone)]
pub struct Variable(Arc<VariableInner>);

struct VariableInner {
    kind: VariableKind,
    ty: ParameterizedType,
    key: Box<str>,
    canonical: Box<str>,
}

#[derive(Debug, Clone)]
pub enum VariableKind {
    /// Field access; `scope` is `None` for static fields
    Field {
        field: FieldRef,
        scope: Option<Variable>,
    },
    Parameter {
        method: MethodRef,
        index: usize,
        name: Arc<str>,
    },
    Local {
        name: Arc<str>,
    },
    Return {
        method: MethodRef,
    },
    /// Array or hidden-content element; a negative constant index is a slice
    Element {
        array: Variable,
        index: Index,
    },
    This {
        type_name: TypeName,
        qualified: bool,
    },
    /// Disposable temporary introduced while decomposing nested expressions
    Intermediate {
        name: Arc<str>,
    },
    Marker {
        name: Arc<str>,
        kind: MarkerKind,
    },
    /// A lambda or method reference value, carrying its own linkage
    FunctionalInterface {
        name: Arc<str>,
        payload: Arc<FunctionalPayload>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Index {
    Constant(i64),
    Variable(Variable),
}

impl Index {
    pub fn is_slice(&self) -> bool {
        matches!(self, Index::Constant(c) if *c < 0)
    }

    /// Component position of a slice index: -1 is component 0
    pub fn slice_component(&self) -> Option<usize> {
        match self {
            Index::Constant(c) if *c < 0 => Some((-c - 1) as usize),
            _ => None,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Constant(c) => write!(f, "{}", c),
            Index::Variable(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Some unknown, freshly created value
    SomeValue,
    /// A compile-time constant or `null`
    Constant,
}

/// What a functional-interface value denotes, and what is known about it
#[derive(Debug)]
pub struct FunctionalPayload {
    /// Synthetic lambda method, or the referenced method
    pub method: MethodRef,
    /// Object of a bound method reference (`list::add`)
    pub scope: Option<Variable>,
    pub summary: Arc<MethodLinkedVariables>,
}

impl Variable {
    // ═══════════════════════════════════════════════════════════════════════
    // Construction
    // ═══════════════════════════════════════════════════════════════════════

    fn from_kind(kind: VariableKind, ty: ParameterizedType) -> Self {
        let (key, canonical) = compute_keys(&kind);
        Variable(Arc::new(VariableInner {
            kind,
            ty,
            key: key.into_boxed_str(),
            canonical: canonical.into_boxed_str(),
        }))
    }

    pub fn field(field: FieldRef, scope: Option<Variable>) -> Self {
        let ty = field.ty.clone();
        Self::from_kind(VariableKind::Field { field, scope }, ty)
    }

    pub fn parameter(method: &MethodRef, index: usize, name: &str, ty: ParameterizedType) -> Self {
        Self::from_kind(
            VariableKind::Parameter {
                method: method.clone(),
                index,
                name: Arc::from(name),
            },
            ty,
        )
    }

    pub fn local(name: &str, ty: ParameterizedType) -> Self {
        Self::from_kind(
            VariableKind::Local {
                name: Arc::from(name),
            },
            ty,
        )
    }

    pub fn return_value(method: &MethodRef, ty: ParameterizedType) -> Self {
        Self::from_kind(
            VariableKind::Return {
                method: method.clone(),
            },
            ty,
        )
    }

    pub fn element(array: Variable, index: Index) -> Self {
        let array_ty = array.ty();
        let ty = match index.slice_component() {
            Some(component) => array_ty
                .tuple_components()
                .and_then(|cs| cs.get(component))
                .map(|c| c.clone().with_arrays(c.arrays + array_ty.arrays))
                .unwrap_or_else(|| array_ty.clone()),
            None => array_ty.copy_with_one_fewer_arrays(),
        };
        Self::from_kind(VariableKind::Element { array, index }, ty)
    }

    pub fn this(type_name: &TypeName, ty: ParameterizedType) -> Self {
        Self::from_kind(
            VariableKind::This {
                type_name: type_name.clone(),
                qualified: false,
            },
            ty,
        )
    }

    /// `Outer.this` inside an inner type
    pub fn qualified_this(type_name: &TypeName, ty: ParameterizedType) -> Self {
        Self::from_kind(
            VariableKind::This {
                type_name: type_name.clone(),
                qualified: true,
            },
            ty,
        )
    }

    pub fn intermediate(name: &str, ty: ParameterizedType) -> Self {
        Self::from_kind(
            VariableKind::Intermediate {
                name: Arc::from(name),
            },
            ty,
        )
    }

    pub fn marker(name: &str, ty: ParameterizedType, kind: MarkerKind) -> Self {
        Self::from_kind(
            VariableKind::Marker {
                name: Arc::from(name),
                kind,
            },
            ty,
        )
    }

    pub fn functional(name: &str, ty: ParameterizedType, payload: FunctionalPayload) -> Self {
        Self::from_kind(
            VariableKind::FunctionalInterface {
                name: Arc::from(name),
                payload: Arc::new(payload),
            },
            ty,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn kind(&self) -> &VariableKind {
        &self.0.kind
    }

    pub fn ty(&self) -> &ParameterizedType {
        &self.0.ty
    }

    pub fn key(&self) -> &str {
        &self.0.key
    }

    pub fn canonical_key(&self) -> &str {
        &self.0.canonical
    }

    pub fn field_ref(&self) -> Option<&FieldRef> {
        match &self.0.kind {
            VariableKind::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Immediately enclosing variable of a field or element
    pub fn scope(&self) -> Option<&Variable> {
        match &self.0.kind {
            VariableKind::Field { scope, .. } => scope.as_ref(),
            VariableKind::Element { array, .. } => Some(array),
            _ => None,
        }
    }

    /// All enclosing variables, nearest first
    pub fn scope_variables(&self) -> Vec<Variable> {
        let mut result = Vec::new();
        let mut current = self.scope();
        while let Some(s) = current {
            result.push(s.clone());
            current = s.scope();
        }
        result
    }

    /// The variable a `Links` bundle containing this variable is about.
    /// Fields of `this` and static fields are their own primary.
    pub fn primary(&self) -> Variable {
        match &self.0.kind {
            VariableKind::Field { scope: None, .. } => self.clone(),
            VariableKind::Field {
                scope: Some(scope), ..
            } => {
                if scope.is_this() {
                    self.clone()
                } else {
                    scope.primary()
                }
            }
            VariableKind::Element { array, .. } => array.primary(),
            _ => self.clone(),
        }
    }

    /// True when `self` is `primary` or reachable from it by field/element containment
    pub fn is_part_of(&self, primary: &Variable) -> bool {
        if self == primary {
            return true;
        }
        let mut current = self.scope();
        while let Some(s) = current {
            if s == primary {
                return true;
            }
            current = s.scope();
        }
        false
    }

    /// `is_part_of` under vertex identity
    pub fn is_canonical_part_of(&self, primary: &Variable) -> bool {
        let target = primary.canonical_key();
        if self.canonical_key() == target {
            return true;
        }
        let mut current = self.scope();
        while let Some(s) = current {
            if s.canonical_key() == target {
                return true;
            }
            current = s.scope();
        }
        false
    }

    /// Outermost enclosing variable, `self` when there is none
    pub fn root(&self) -> Variable {
        let mut current = self.clone();
        while let Some(s) = current.scope().cloned() {
            current = s;
        }
        current
    }

    pub fn is_this(&self) -> bool {
        matches!(self.0.kind, VariableKind::This { .. })
    }

    pub fn is_return(&self) -> bool {
        matches!(self.0.kind, VariableKind::Return { .. })
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.0.kind, VariableKind::Parameter { .. })
    }

    pub fn is_local(&self) -> bool {
        matches!(self.0.kind, VariableKind::Local { .. })
    }

    pub fn is_intermediate(&self) -> bool {
        matches!(self.0.kind, VariableKind::Intermediate { .. })
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.0.kind, VariableKind::Marker { .. })
    }

    pub fn is_constant_marker(&self) -> bool {
        matches!(
            self.0.kind,
            VariableKind::Marker {
                kind: MarkerKind::Constant,
                ..
            }
        )
    }

    pub fn is_functional(&self) -> bool {
        matches!(self.0.kind, VariableKind::FunctionalInterface { .. })
    }

    pub fn is_virtual_field(&self) -> bool {
        self.field_ref().map_or(false, |f| f.is_virtual())
    }

    pub fn is_mutation_marker(&self) -> bool {
        self.field_ref().map_or(false, |f| f.is_mutation_marker())
    }

    pub fn is_slice(&self) -> bool {
        matches!(&self.0.kind, VariableKind::Element { index, .. } if index.is_slice())
    }

    pub fn parameter_index(&self) -> Option<usize> {
        match &self.0.kind {
            VariableKind::Parameter { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&Arc<FunctionalPayload>> {
        match &self.0.kind {
            VariableKind::FunctionalInterface { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Fields traversed from the primary down to this variable
    pub fn fields_in_chain(&self) -> Vec<FieldRef> {
        let mut result = Vec::new();
        let mut current = Some(self);
        while let Some(v) = current {
            if let Some(f) = v.field_ref() {
                result.push(f.clone());
            }
            current = v.scope();
        }
        result
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Substitution
    // ═══════════════════════════════════════════════════════════════════════

    /// Structurally replace `from` by `to` anywhere in this variable
    pub fn substitute(&self, from: &Variable, to: &Variable) -> Variable {
        self.map_parts(&mut |v| if v == from { Some(to.clone()) } else { None })
    }

    /// Rebuild this variable bottom-up, replacing every part for which `f`
    /// returns a value. Parts are visited top-down so a replaced scope is not
    /// traversed further.
    pub fn map_parts(&self, f: &mut dyn FnMut(&Variable) -> Option<Variable>) -> Variable {
        if let Some(replacement) = f(self) {
            return replacement;
        }
        match &self.0.kind {
            VariableKind::Field {
                field,
                scope: Some(scope),
            } => {
                let new_scope = scope.map_parts(f);
                if &new_scope == scope {
                    self.clone()
                } else {
                    Variable::field(field.clone(), Some(new_scope))
                }
            }
            VariableKind::Element { array, index } => {
                let new_array = array.map_parts(f);
                let new_index = match index {
                    Index::Variable(v) => Index::Variable(v.map_parts(f)),
                    Index::Constant(c) => Index::Constant(*c),
                };
                if &new_array == array && &new_index == index {
                    self.clone()
                } else {
                    Variable::element(new_array, new_index)
                }
            }
            _ => self.clone(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rendering
    // ═══════════════════════════════════════════════════════════════════════

    /// Render with the `primary` part omitted, e.g. `§ts` for `rv.§ts`
    pub fn render_relative(&self, primary: &Variable) -> String {
        self.render(Some(primary))
    }

    fn render(&self, relative_to: Option<&Variable>) -> String {
        if relative_to == Some(self) {
            return String::new();
        }
        match &self.0.kind {
            VariableKind::Field { field, scope } => match scope {
                None => format!("{}.{}", field.owner.simple_name(), field.name),
                Some(s) => {
                    let rendered = if s.is_this() && !matches!(s.kind(), VariableKind::This { qualified: true, .. }) {
                        String::new()
                    } else {
                        s.render(relative_to)
                    };
                    if rendered.is_empty() {
                        field.name.to_string()
                    } else {
                        format!("{}.{}", rendered, field.name)
                    }
                }
            },
            VariableKind::Parameter { index, name, .. } => format!("{}:{}", index, name),
            VariableKind::Local { name }
            | VariableKind::Intermediate { name }
            | VariableKind::Marker { name, .. }
            | VariableKind::FunctionalInterface { name, .. } => name.to_string(),
            VariableKind::Return { method } => method.simple_name().to_string(),
            VariableKind::Element { array, index } => {
                format!("{}[{}]", array.render(relative_to), index)
            }
            VariableKind::This {
                type_name,
                qualified,
            } => {
                if *qualified {
                    format!("{}.this", type_name.simple_name())
                } else {
                    "this".to_string()
                }
            }
        }
    }
}

fn compute_keys(kind: &VariableKind) -> (String, String) {
    match kind {
        VariableKind::Field { field, scope } => {
            let (scope_key, scope_canonical) = match scope {
                Some(s) => (s.key().to_string(), s.canonical_key().to_string()),
                None => ("static".to_string(), "static".to_string()),
            };
            let key = format!("F:{}.{}@{}", field.owner, field.name, scope_key);
            // virtual fields are keyed by slot so that differently named views
            // of the same hidden content (`§ts`, `§$s`) share a vertex
            let canonical = if let Some(kind) = field.virtual_kind {
                let slot = match kind {
                    VirtualKind::Mutation => "§m".to_string(),
                    VirtualKind::HiddenContent => format!("§hc{}", field.ty.arrays),
                    VirtualKind::Component(i) => format!("§c{}", i),
                };
                format!("{}@{}", slot, scope_canonical)
            } else {
                format!("{}.{}@{}", field.owner, field.name, scope_canonical)
            };
            (key, canonical)
        }
        VariableKind::Element { array, index } => {
            let (index_key, index_canonical) = match index {
                Index::Constant(c) => (c.to_string(), c.to_string()),
                Index::Variable(v) => (v.key().to_string(), v.canonical_key().to_string()),
            };
            (
                format!("E:{}[{}]", array.key(), index_key),
                format!("{}[{}]", array.canonical_key(), index_canonical),
            )
        }
        VariableKind::Parameter { method, index, .. } => same(format!("P:{}#{}", method, index)),
        VariableKind::Local { name } => same(format!("L:{}", name)),
        VariableKind::Return { method } => same(format!("R:{}", method)),
        VariableKind::This { type_name, .. } => same(format!("T:{}", type_name)),
        VariableKind::Intermediate { name } => same(format!("I:{}", name)),
        VariableKind::Marker { name, .. } => same(format!("M:{}", name)),
        VariableKind::FunctionalInterface { name, .. } => same(format!("Φ:{}", name)),
    }
}

fn same(key: String) -> (String, String) {
    (key.clone(), key)
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.key == other.0.key
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key.cmp(&other.0.key)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({})", self.0.key)
    }
}
