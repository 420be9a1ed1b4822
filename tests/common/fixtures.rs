//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use embedcache::provider::ScriptedProvider;
use embedcache::retry::RetryConfig;
use embedcache::{CacheConfig, Config, EmbeddingCache, EmbeddingRequest};
use tempfile::TempDir;

pub const HOLA_KEY: &str = "b58e4a60c963f8b3c43d83cc9245020ce71d8311fa2f48cfd36deed6f472a71b";
pub const HOLA_HELLO_KEY: &str =
    "2e41e52e67421c1d106bb8a5b9225ad1143761240862ed61e5be5ed20f39f2fd";

pub const SMALL_DIM: usize = 8;

/// Retry policy that backs off for a millisecond at most.
pub fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_base_delay(Duration::from_millis(1))
        .without_jitter()
}

pub fn config_for(dir: &TempDir, backend: &str) -> Config {
    Config {
        cache: CacheConfig::default()
            .with_data_dir(dir.path())
            .with_backend(backend),
        retry: fast_retry(),
        ..Config::default()
    }
}

pub struct CacheFixture {
    pub cache: EmbeddingCache<Arc<ScriptedProvider>>,
    pub provider: Arc<ScriptedProvider>,
    pub dir: TempDir,
}

impl CacheFixture {
    pub fn new(backend: &str, provider: ScriptedProvider) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let provider = Arc::new(provider);
        let cache = EmbeddingCache::new(Arc::clone(&provider), &config_for(&dir, backend));
        Self {
            cache,
            provider,
            dir,
        }
    }

    pub fn json() -> Self {
        Self::new("json", ScriptedProvider::new(SMALL_DIM))
    }

    pub fn tensor() -> Self {
        Self::new("tensor", ScriptedProvider::new(SMALL_DIM))
    }

    /// Files currently in the cache directory.
    pub fn file_count(&self) -> usize {
        std::fs::read_dir(self.dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn sample_requests() -> Vec<EmbeddingRequest> {
    vec![
        EmbeddingRequest::single("hola"),
        EmbeddingRequest::batch(["hola", "hello"]),
        EmbeddingRequest::batch(["The cat runs.", "El gato corre.", "Le chat court."]),
        EmbeddingRequest::single(""),
        EmbeddingRequest::single("emoji \u{1F600} and accents: café"),
    ]
}
