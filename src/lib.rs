//! Embedding cache library crate (used by the `embedcache` binary and
//! integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`EmbeddingRequest`], [`Embeddings`] - What is asked for and what comes back
//! - [`CacheKey`], [`derive_key`] - Content-addressed file names
//! - [`EmbeddingCache`] - Compute-or-reuse facade
//! - [`CacheStore`] - File-per-request store with no-clobber writes
//!
//! ## Storage Formats
//! - [`SerializationBackend`], [`BackendRegistry`] - Pluggable encodings
//! - [`JsonBackend`] (`json`), [`TensorBackend`] (`tensor`) - Built-in formats
//!
//! ## Providers & Retries
//! - [`EmbeddingProvider`] - Remote embedding call
//! - [`HttpProvider`], [`NativeClientProvider`] - OpenAI-compatible clients
//! - [`RetryingProvider`], [`RetryConfig`] - Backoff on rate limits
//!
//! ## Configuration
//! - [`Config`], [`CacheConfig`], [`ProviderConfig`] - Explicit configuration objects
//!
//! ## Test/Mock Support
//! [`ScriptedProvider`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod hashing;
pub mod provider;
pub mod retry;
pub mod storage;

pub use cache::{EmbeddingCache, get_or_compute};
pub use config::{CacheConfig, Config, ConfigError, ProviderConfig};
pub use constants::{DEFAULT_BACKEND, DEFAULT_DATA_DIR, DEFAULT_EMBEDDING_DIM, DEFAULT_MODEL};
pub use embedding::{EmbeddingRequest, Embeddings};
pub use hashing::{CacheKey, canonical_bytes, derive_key};
#[cfg(any(test, feature = "mock"))]
pub use provider::ScriptedProvider;
pub use provider::{
    EmbeddingProvider, HttpProvider, NativeClientProvider, ProviderError, ProviderKind,
    ProviderResult, build_provider,
};
pub use retry::{RetryConfig, RetryingProvider, wrap};
pub use storage::{
    BackendError, BackendRegistry, CacheError, CacheLookup, CacheOutcome, CacheResult,
    CacheStore, JsonBackend, SaveOutcome, SerializationBackend, TensorBackend,
};
