//! Linkage infrastructure: graph algorithms and reference port implementations

pub mod closure;
pub mod declared_facts;
pub mod fixpoint;
pub mod hidden_content;
pub mod in_memory_model;
pub mod link_graph;
pub mod projection;
pub mod slice;
pub mod summary_codec;
pub mod translation;

pub use closure::GraphBuilder;
pub use declared_facts::DeclaredFacts;
pub use fixpoint::{compute_path_labels, SelfLoop};
pub use hidden_content::DefaultHiddenContent;
pub use link_graph::{LinkGraph, VertexId};
pub use projection::follow_graph;
pub use slice::SliceCompletion;
pub use summary_codec::{LinkRecord, SummaryCodec, SummaryRecord};
pub use translation::TranslationMap;
