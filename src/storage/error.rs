use std::path::PathBuf;

use thiserror::Error;

use crate::hashing::CacheKey;
use crate::provider::ProviderError;

/// Failures while encoding or decoding one cache file.
#[derive(Error, Debug)]
pub enum BackendError {
    /// JSON text could not be produced or parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Safetensors container could not be produced or parsed.
    #[error("safetensors error: {0}")]
    Tensor(#[from] safetensors::SafeTensorError),

    /// NaN or infinity, which the text format cannot represent.
    #[error("non-finite value at flat index {index}")]
    NonFinite { index: usize },

    /// Matrix rows differ in length.
    #[error("ragged matrix: row {row} has {actual} values, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Stored tensor has an element type other than `F32`.
    #[error("unsupported tensor dtype {found}")]
    Dtype { found: String },

    /// Stored tensor is neither a vector nor a matrix.
    #[error("unsupported tensor shape {shape:?}")]
    Rank { shape: Vec<usize> },

    /// Decoded value does not have the shape the request implies.
    #[error("unexpected shape: {reason}")]
    UnexpectedShape { reason: String },
}

/// Errors surfaced by [`crate::storage::CacheStore`] and the caching facade.
///
/// A missing cache file and a lost write race are not errors; they never
/// reach the caller.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No backend is registered under this format tag.
    #[error("unknown serialization backend '{tag}'")]
    UnknownBackend { tag: String },

    /// A cache file exists but does not decode. Never treated as a miss.
    #[error("corrupt cache entry {key} at {path} ({backend}): {source}")]
    Corrupted {
        key: CacheKey,
        path: PathBuf,
        backend: String,
        #[source]
        source: BackendError,
    },

    /// Freshly computed vectors could not be encoded.
    #[error("failed to encode {key} with {backend}: {source}")]
    Encode {
        key: CacheKey,
        backend: String,
        #[source]
        source: BackendError,
    },

    /// Filesystem failure other than "not found".
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider failed permanently (or retries were exhausted).
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
