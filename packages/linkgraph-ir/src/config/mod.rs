//! Configuration system
//!
//! - Presets (fast / balanced / thorough / custom)
//! - Builder-style overrides with range validation
//! - YAML schema v1 import/export

pub mod error;
pub mod io;
pub mod link_config;
pub mod preset;

pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use link_config::LinkConfig;
pub use preset::Preset;
