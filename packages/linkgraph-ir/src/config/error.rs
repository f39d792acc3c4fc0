//! Errors raised while building, loading or validating a `LinkConfig`

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting outside its accepted interval
    #[error("{field} = {value} is outside {min}..={max} ({hint})")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    #[error("configuration has no 'version' key; start the file with 'version: 1'")]
    MissingVersion,

    #[error("configuration version {found} is not readable (known: {})", join(supported))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("no preset named '{0}' (fast, balanced, thorough, custom)")]
    UnknownPreset(String),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Settings that are fine alone but contradict each other
    #[error("inconsistent configuration: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn join(versions: &[u32]) -> String {
    versions
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    pub fn out_of_range(
        field: &str,
        value: impl ToString,
        range: std::ops::RangeInclusive<usize>,
        hint: &str,
    ) -> Self {
        Self::Range {
            field: field.to_string(),
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
            hint: hint.to_string(),
        }
    }
}
