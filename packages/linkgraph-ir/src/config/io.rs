//! Configuration I/O: YAML schema v1
//!
//! ```yaml
//! version: 1
//! preset: balanced
//! overrides:
//!   max_closure_iterations: 12
//!   force_shallow: false
//! ```

use serde::{Deserialize, Serialize};

/// Schema versions this crate can read
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides; absent fields keep the preset value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_closure_iterations: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_shallow: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub leak_conditional_sub_links: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_duplicate_primaries: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_call_depth: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<usize>,
}
