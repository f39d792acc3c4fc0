//! Linkage engine configuration
//!
//! # Usage
//!
//! ```text
//! let config = LinkConfig::from_preset(Preset::Fast).max_call_depth(4);
//! config.validate()?;
//!
//! let config = LinkConfig::from_yaml_str("version: 1\npreset: thorough\n")?;
//! ```

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides, SUPPORTED_VERSIONS};
use super::preset::Preset;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub preset: Preset,

    /// Bound on closure passes per graph; exceeding it is an invariant violation
    pub max_closure_iterations: usize,

    /// Analyze every method from declared facts only
    pub force_shallow: bool,

    /// Keep links of sub-variables of the temporary an inline conditional creates
    pub leak_conditional_sub_links: bool,

    /// Verify the Links invariant after every projection
    pub check_duplicate_primaries: bool,

    /// Nested source computations beyond this depth fall back to shallow summaries
    pub max_call_depth: usize,

    /// Analyze types in parallel (rayon)
    pub parallel: bool,

    /// Worker threads; 0 means one per CPU
    pub num_workers: usize,
}

impl LinkConfig {
    pub fn preset(preset: Preset) -> Self {
        Self::from_preset(preset)
    }

    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                preset,
                max_closure_iterations: 10,
                force_shallow: false,
                leak_conditional_sub_links: false,
                check_duplicate_primaries: false,
                max_call_depth: 8,
                parallel: true,
                num_workers: 0,
            },
            Preset::Balanced | Preset::Custom => Self {
                preset,
                max_closure_iterations: 16,
                force_shallow: false,
                leak_conditional_sub_links: false,
                check_duplicate_primaries: true,
                max_call_depth: 32,
                parallel: true,
                num_workers: 0,
            },
            Preset::Thorough => Self {
                preset,
                max_closure_iterations: 32,
                force_shallow: false,
                leak_conditional_sub_links: true,
                check_duplicate_primaries: true,
                max_call_depth: 128,
                parallel: true,
                num_workers: 0,
            },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Builder
    // ═══════════════════════════════════════════════════════════════════════

    pub fn max_closure_iterations(mut self, n: usize) -> Self {
        self.max_closure_iterations = n;
        self
    }

    pub fn force_shallow(mut self, v: bool) -> Self {
        self.force_shallow = v;
        self
    }

    pub fn leak_conditional_sub_links(mut self, v: bool) -> Self {
        self.leak_conditional_sub_links = v;
        self
    }

    pub fn check_duplicate_primaries(mut self, v: bool) -> Self {
        self.check_duplicate_primaries = v;
        self
    }

    pub fn max_call_depth(mut self, n: usize) -> Self {
        self.max_call_depth = n;
        self
    }

    pub fn parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Effective worker count
    pub fn workers(&self) -> usize {
        if self.num_workers == 0 {
            num_cpus::get()
        } else {
            self.num_workers
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════════════════

    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=1000).contains(&self.max_closure_iterations) {
            return Err(ConfigError::out_of_range(
                "max_closure_iterations",
                self.max_closure_iterations,
                1..=1000,
                "Closure needs at least one pass; well-formed graphs converge in a handful",
            ));
        }
        if !(1..=10_000).contains(&self.max_call_depth) {
            return Err(ConfigError::out_of_range(
                "max_call_depth",
                self.max_call_depth,
                1..=10_000,
                "Use force_shallow to disable source analysis instead of a zero depth",
            ));
        }
        if self.num_workers > 1024 {
            return Err(ConfigError::out_of_range(
                "num_workers",
                self.num_workers,
                0..=1024,
                "0 selects one worker per CPU",
            ));
        }
        if !self.parallel && self.num_workers > 1 {
            return Err(ConfigError::Validation(format!(
                "num_workers={} has no effect with parallel=false",
                self.num_workers
            )));
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // YAML
    // ═══════════════════════════════════════════════════════════════════════

    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.get("version").is_none() {
            return Err(ConfigError::MissingVersion);
        }
        let export: ConfigExportV1 = serde_yaml::from_value(value)?;

        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = export.preset.parse()?;

        let mut config = Self::from_preset(preset);
        if let Some(o) = export.overrides {
            config.apply(o);
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, o: ConfigOverrides) {
        if let Some(v) = o.max_closure_iterations {
            self.max_closure_iterations = v;
        }
        if let Some(v) = o.force_shallow {
            self.force_shallow = v;
        }
        if let Some(v) = o.leak_conditional_sub_links {
            self.leak_conditional_sub_links = v;
        }
        if let Some(v) = o.check_duplicate_primaries {
            self.check_duplicate_primaries = v;
        }
        if let Some(v) = o.max_call_depth {
            self.max_call_depth = v;
        }
        if let Some(v) = o.parallel {
            self.parallel = v;
        }
        if let Some(v) = o.num_workers {
            self.num_workers = v;
        }
    }

    /// Export as YAML v1; every field is written as an override
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: self.preset.to_string(),
            overrides: Some(ConfigOverrides {
                max_closure_iterations: Some(self.max_closure_iterations),
                force_shallow: Some(self.force_shallow),
                leak_conditional_sub_links: Some(self.leak_conditional_sub_links),
                check_duplicate_primaries: Some(self.check_duplicate_primaries),
                max_call_depth: Some(self.max_call_depth),
                parallel: Some(self.parallel),
                num_workers: Some(self.num_workers),
            }),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}
