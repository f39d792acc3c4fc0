//! Linkage domain: lattice, links, summaries, snapshots

pub mod link;
pub mod link_nature;
pub mod link_result;
pub mod method_links;
pub mod variable_data;

pub use link::{add_link, merge_links, Link, LinkedVariables, Links};
pub use link_nature::{LinkKind, LinkNature, PassThrough};
pub use link_result::{LinkResult, PendingCall};
pub use method_links::MethodLinkedVariables;
pub use variable_data::{LinkedToObject, VariableData};
