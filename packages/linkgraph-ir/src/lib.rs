/*
 * Linkgraph IR - Linkage / Aliasing Analysis Engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Program model (types, variables, statements, expressions)
 * - features/    : Vertical slices (linkage: lattice → graph → projection → orchestration)
 * - config/      : Presets, validation, YAML I/O
 *
 * Performance:
 * - Arena graph with integer vertex ids
 * - Write-once DashMap memo shared by rayon workers
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Translation helpers thread a lot of context
#![allow(clippy::type_complexity)] // Nested map types are necessary for analysis
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::collapsible_if)] // Readability over brevity
#![allow(clippy::collapsible_else_if)] // else if clarity
#![allow(clippy::match_like_matches_macro)] // Match for readability
#![allow(clippy::single_match)] // Single match for readability
#![allow(clippy::mutable_key_type)] // Variable hashes an immutable cached key

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration system (presets, validation, YAML)
pub mod config;

/// Error types
pub mod errors;

/// Shared program model
pub mod shared;

/// Feature modules
pub mod features;

pub use errors::{ErrorRecord, LinkError, Result};
pub use features::linkage::{
    follow_graph, GraphBuilder, Link, LinkComputer, LinkGraph, LinkNature, Links,
    MethodLinkedVariables, SummaryOutcome, VariableData,
};
pub use shared::models::{Program, ProgramBuilder, Variable};
