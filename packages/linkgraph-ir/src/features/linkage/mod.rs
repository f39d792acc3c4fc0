//! Linkage analysis
//!
//! ```text
//! domain          LinkNature lattice, Link/Links, summaries, snapshots
//! infrastructure  fixpoint, graph, closure, projection, reference ports
//! application     per-method orchestration, expressions, calls, lambdas
//! ports           TypeModel, HiddenContentProvider, MethodFactProvider
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{
    ExpressionVisitor, FunctionalInterfaceLinker, LinkComputer, LinkMethodCall, LinkStats,
    ShallowLinkComputer, SummaryOutcome,
};
pub use domain::{
    Link, LinkKind, LinkNature, LinkResult, LinkedToObject, LinkedVariables, Links,
    MethodLinkedVariables, VariableData,
};
pub use infrastructure::{
    compute_path_labels, follow_graph, DeclaredFacts, DefaultHiddenContent, GraphBuilder,
    LinkGraph, SliceCompletion, SummaryCodec,
};
pub use ports::{HiddenContentProvider, MethodFactProvider, TypeModel};
