//! Application layer: turning method bodies into summaries
//!
//! - `link_computer`: memo, recursion control, type-level driver
//! - `source_method`: statement walk and snapshots
//! - `expression_visitor` / `method_call` / `functional_interface`: expression synthesis
//! - `shallow`: summaries from declared facts only

mod context;
pub mod expression_visitor;
pub mod functional_interface;
pub mod link_computer;
pub mod method_call;
pub mod recursion;
pub mod shallow;
pub mod source_method;

pub use context::MethodContext;
pub use expression_visitor::ExpressionVisitor;
pub use functional_interface::{FunctionalInterfaceLinker, FunctionalView};
pub use link_computer::{LinkComputer, LinkStats, SummaryOutcome};
pub use method_call::LinkMethodCall;
pub use recursion::{AnalysisTask, RecursionGuard};
pub use shallow::{SamShape, ShallowLinkComputer};
pub use source_method::{SourceMethodComputer, SourceOutcome};
