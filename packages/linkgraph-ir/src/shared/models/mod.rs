//! Shared models

pub mod expression;
pub mod program;
pub mod types;
pub mod variable;

pub use expression::{
    Assignment, Block, Constant, ConstructorCall, Expression, InlineConditional, Lambda,
    MethodCall, MethodReference, Statement,
};
pub use program::{
    Independence, IndependenceLevel, MethodBuilder, MethodFacts, MethodInfo, ParameterFacts,
    ParameterInfo, Program, ProgramBuilder, TypeInfo, RETURN_SLOT,
};
pub use types::{
    FieldInfo, FieldRef, MethodRef, ParameterizedType, Primitive, TypeBase, TypeName,
    TypeParameter, TypeParameterOwner, VirtualKind,
};
pub use variable::{FunctionalPayload, Index, MarkerKind, Variable, VariableKind};
