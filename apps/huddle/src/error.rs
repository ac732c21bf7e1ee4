//! Error types of the client application.
//!
//! Remote-call errors never show up here: they travel as
//! [`huddle_core::ApiError`] inside envelopes and slice state. These types
//! cover what goes wrong around the store (files, configuration, output).

use huddle_core::ApiError;
use std::path::PathBuf;
use thiserror::Error;

/// A configuration or fixture file could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Top-level error of the `huddle` binary.
#[derive(Debug, Error)]
pub enum HuddleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HuddleError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
