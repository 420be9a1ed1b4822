//! Cross-cutting, shared constants.
//!
//! These are the process-wide defaults used by [`crate::config::Config::default`].
//! Nothing in the library reads them implicitly at call time; they only seed
//! configuration values that callers may override.

/// Dimension of vectors produced by the default model.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Bytes needed to hold one default-dimension vector as little-endian `f32`.
pub const EMBEDDING_F32_BYTES: usize = DEFAULT_EMBEDDING_DIM * 4;

/// Remote embedding model used when none is configured.
pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";

/// Base URL of the OpenAI-compatible REST API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Relative directory where cache files are written by default.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Format tag of the backend used by default.
pub const DEFAULT_BACKEND: &str = "json";

/// Name of the single tensor stored in a tensor-backend cache file.
pub const TENSOR_ENTRY_NAME: &str = "embeddings";

/// Default connect + read timeout for a single remote call, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
