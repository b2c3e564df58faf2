use thiserror::Error;

use crate::types::ComponentId;

/// Contract violations in the extractor's output. Fatal for the run.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("malformed component records: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("component {index} has an empty required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("component id '{0}' appears more than once")]
    DuplicateComponent(ComponentId),

    #[error("failed to read component records from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration rejected before any analysis runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{field}' = {value} is out of range; expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("weights in '{group}' must not all be zero")]
    ZeroWeights { group: &'static str },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Any failure of an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("analysis cancelled before stage '{stage}'")]
    Cancelled { stage: &'static str },
}
