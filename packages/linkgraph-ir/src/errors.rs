//! Error types for linkgraph-ir
//!
//! Two failure classes exist besides configuration problems:
//! - invariant violations: engine defects, abort the whole top-level request
//! - unsupported input shapes: fatal for one method, recorded as "summary unavailable"

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for linkage operations
#[derive(Debug, Error)]
pub enum LinkError {
    /// A modeling invariant of the engine was broken
    #[error("Invariant '{invariant}' violated in {method}: {message}")]
    InvariantViolation {
        method: String,
        invariant: &'static str,
        message: String,
    },

    /// The input contains a construct the engine cannot interpret
    #[error("Unsupported construct in {method} during {phase}: {message}")]
    Unsupported {
        method: String,
        phase: Phase,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Analysis phase where a failure was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Expression,
    MethodCall,
    FunctionalInterface,
    Closure,
    Projection,
    Shallow,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Expression => "expression",
            Phase::MethodCall => "method-call",
            Phase::FunctionalInterface => "functional-interface",
            Phase::Closure => "closure",
            Phase::Projection => "projection",
            Phase::Shallow => "shallow",
        };
        f.write_str(s)
    }
}

impl LinkError {
    /// Create an invariant violation
    pub fn invariant(
        method: impl fmt::Display,
        invariant: &'static str,
        message: impl Into<String>,
    ) -> Self {
        LinkError::InvariantViolation {
            method: method.to_string(),
            invariant,
            message: message.into(),
        }
    }

    /// Create an unsupported-construct error
    pub fn unsupported(method: impl fmt::Display, phase: Phase, message: impl Into<String>) -> Self {
        LinkError::Unsupported {
            method: method.to_string(),
            phase,
            message: message.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, LinkError::Unsupported { .. })
    }

    /// Structured record for an unavailable summary; `None` for errors that must propagate.
    pub fn to_record(&self) -> Option<ErrorRecord> {
        match self {
            LinkError::Unsupported {
                method,
                phase,
                message,
            } => Some(ErrorRecord {
                method: method.clone(),
                phase: *phase,
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

/// Why a method summary is unavailable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub method: String,
    pub phase: Phase,
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.method, self.phase, self.message)
    }
}

/// Result type alias for linkage operations
pub type Result<T> = std::result::Result<T, LinkError>;
