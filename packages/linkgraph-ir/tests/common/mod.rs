//! Common test utilities for linkgraph-ir
//!
//! Fixture types modeled after a small slice of a collection library,
//! program builders and summary assertions shared by the integration tests.

#![allow(dead_code)]

mod fixtures;
mod assertions;
mod builders;

// Re-export all utilities
pub use fixtures::*;
pub use assertions::*;
pub use builders::*;
