use thiserror::Error;

use crate::train::trainer::TrainerState;

/// Result alias used by every fallible engine operation.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Precondition violations rejected at the engine's call boundary.
///
/// None of these describe numeric trouble inside a well-formed computation;
/// degenerate inputs (an all-zero feature vector, a loss that never drops
/// below the threshold) are not errors and never show up here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{what} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("matrix rows have differing lengths")]
    RaggedMatrix,

    #[error("learning rate must be positive and finite, got {0}")]
    InvalidLearningRate(f64),

    #[error("target must lie in [0, 1], got {0}")]
    InvalidTarget(f64),

    #[error("{0} must be finite")]
    NonFiniteInput(&'static str),

    #[error("unknown activation function `{0}`")]
    UnknownActivation(String),

    #[error("cannot {op} while trainer is {state:?}")]
    InvalidState { op: &'static str, state: TrainerState },

    #[error("invalid run configuration: {0}")]
    InvalidRunConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures while loading or validating an `EngineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
