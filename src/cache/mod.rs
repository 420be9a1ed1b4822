//! Compute-or-reuse facade.
//!
//! [`EmbeddingCache`] owns a [`CacheStore`], a provider wrapped in
//! [`RetryingProvider`] and the default [`CacheConfig`]. A request is answered
//! from disk when its file exists; otherwise the provider is called (backing
//! off on rate limits) and the result is written for next time.

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::Path;

use tracing::instrument;

use crate::config::{CacheConfig, Config};
use crate::embedding::{EmbeddingRequest, Embeddings};
use crate::provider::EmbeddingProvider;
use crate::retry::{RetryConfig, RetryingProvider};
use crate::storage::{BackendRegistry, CacheLookup, CacheResult, CacheStore};

/// Caching facade over one provider.
pub struct EmbeddingCache<P> {
    store: CacheStore,
    provider: RetryingProvider<P>,
    defaults: CacheConfig,
}

impl<P> fmt::Debug for EmbeddingCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("store", &self.store)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl<P> EmbeddingCache<P>
where
    P: EmbeddingProvider,
{
    /// Builds the facade from `config` (cache layout and retry policy).
    pub fn new(provider: P, config: &Config) -> Self {
        Self::from_parts(
            provider,
            config.cache.clone(),
            config.retry.clone(),
            BackendRegistry::with_defaults(),
        )
    }

    /// Builds the facade with an explicit backend registry.
    pub fn from_parts(
        provider: P,
        cache: CacheConfig,
        retry: RetryConfig,
        registry: BackendRegistry,
    ) -> Self {
        let store = CacheStore::with_registry(&cache.data_dir, registry.into());
        Self {
            store,
            provider: RetryingProvider::new(provider, retry),
            defaults: cache,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn provider(&self) -> &RetryingProvider<P> {
        &self.provider
    }

    pub fn defaults(&self) -> &CacheConfig {
        &self.defaults
    }

    pub fn data_dir(&self) -> &Path {
        self.store.data_dir()
    }

    /// Returns vectors for `request` using the default directory and backend.
    pub async fn get_or_compute(&self, request: &EmbeddingRequest) -> CacheResult<Embeddings> {
        Ok(self.lookup(request).await?.embeddings)
    }

    /// Like [`get_or_compute`](Self::get_or_compute) but also reports the
    /// key, path and whether the provider was called.
    #[instrument(skip(self, request), fields(texts = request.len(), backend = %self.defaults.backend))]
    pub async fn lookup(&self, request: &EmbeddingRequest) -> CacheResult<CacheLookup> {
        self.store
            .get_or_compute(request, &self.defaults.backend, &self.provider)
            .await
    }

    /// Per-call override of directory and backend.
    #[instrument(skip(self, request, cache), fields(texts = request.len(), backend = %cache.backend))]
    pub async fn lookup_in(
        &self,
        request: &EmbeddingRequest,
        cache: &CacheConfig,
    ) -> CacheResult<CacheLookup> {
        if cache.data_dir == self.defaults.data_dir {
            return self
                .store
                .get_or_compute(request, &cache.backend, &self.provider)
                .await;
        }

        self.store
            .relocated(&cache.data_dir)
            .get_or_compute(request, &cache.backend, &self.provider)
            .await
    }
}

/// One-shot `get_or_compute`: no retry wrapper, built-in backends.
///
/// `provider` is called as-is; wrap it in [`RetryingProvider`] first if rate
/// limits should be retried.
pub async fn get_or_compute<P>(
    request: &EmbeddingRequest,
    provider: &P,
    data_dir: impl AsRef<Path>,
    backend: &str,
) -> CacheResult<Embeddings>
where
    P: EmbeddingProvider + ?Sized,
{
    let store = CacheStore::new(data_dir.as_ref());
    Ok(store
        .get_or_compute(request, backend, provider)
        .await?
        .embeddings)
}
