//! Shared module - Program model consumed by the linkage engine
//!
//! Types, fields, methods, statements, expressions and variables. The engine
//! only reads this model; it never mutates a `Program` after it is built.

pub mod models;

// Re-exports for convenience
pub use models::*;
