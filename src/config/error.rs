//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment value could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    ParseInt {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A value parsed but is outside the accepted range.
    #[error("invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
