//! On-disk cache of embeddings, one file per request.
//!
//! Files live at `<data_dir>/<key>.<extension>`, where the key is the BLAKE3
//! digest of the request and the extension belongs to the chosen backend.
//! Writes go through a temporary file in the same directory and are published
//! with a no-clobber rename, so a reader never observes a partial file and the
//! second of two racing writers fails instead of overwriting.

pub mod backend;
pub mod error;


pub use backend::{BackendRegistry, JsonBackend, SerializationBackend, TensorBackend};
pub use error::{BackendError, BackendResult, CacheError, CacheResult};

use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::embedding::{EmbeddingRequest, Embeddings};
use crate::hashing::CacheKey;
use crate::provider::{EmbeddingProvider, ProviderError, ProviderResult};

/// How a [`CacheStore::get_or_compute`] call was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Decoded from an existing file.
    Loaded,
    /// Computed and written by this call.
    Saved,
    /// Computed, but another writer published the file first.
    RaceLost,
}

/// Result of a single save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    AlreadyExists,
}

/// Vectors plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub embeddings: Embeddings,
    pub outcome: CacheOutcome,
    pub key: CacheKey,
    pub path: PathBuf,
}

impl CacheLookup {
    /// Returns `true` when the provider was not called.
    pub fn is_hit(&self) -> bool {
        self.outcome == CacheOutcome::Loaded
    }
}

#[derive(Debug, Clone)]
/// File-per-entry embedding store rooted at one directory.
pub struct CacheStore {
    data_dir: PathBuf,
    registry: Arc<BackendRegistry>,
}

impl CacheStore {
    /// Store under `data_dir` with the built-in `json` and `tensor` backends.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(data_dir, Arc::new(BackendRegistry::with_defaults()))
    }

    /// Store under `data_dir` resolving tags through `registry`.
    pub fn with_registry(data_dir: impl Into<PathBuf>, registry: Arc<BackendRegistry>) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry,
        }
    }

    /// Same backends, different directory.
    pub fn relocated(&self, data_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(data_dir, Arc::clone(&self.registry))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Creates the data directory if missing.
    pub fn ensure_data_dir(&self) -> CacheResult<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| CacheError::io(&self.data_dir, e))
    }

    fn backend(&self, tag: &str) -> CacheResult<Arc<dyn SerializationBackend>> {
        self.registry
            .get(tag)
            .ok_or_else(|| CacheError::UnknownBackend {
                tag: tag.to_string(),
            })
    }

    fn path_for(&self, key: &CacheKey, backend: &dyn SerializationBackend) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", key, backend.extension()))
    }

    /// Path of the file holding `key` under the backend tagged `tag`.
    pub fn entry_path(&self, key: &CacheKey, tag: &str) -> CacheResult<PathBuf> {
        let backend = self.backend(tag)?;
        Ok(self.path_for(key, backend.as_ref()))
    }

    /// Returns `true` if a file exists for `key` under `tag`.
    pub fn contains(&self, key: &CacheKey, tag: &str) -> CacheResult<bool> {
        Ok(self.entry_path(key, tag)?.is_file())
    }

    /// Reads and decodes `key`.
    ///
    /// `Ok(None)` only when the file does not exist. A file that exists but
    /// fails to decode is [`CacheError::Corrupted`].
    pub fn load(&self, key: &CacheKey, tag: &str) -> CacheResult<Option<Embeddings>> {
        let backend = self.backend(tag)?;
        let path = self.path_for(key, backend.as_ref());

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        backend
            .decode(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Corrupted {
                key: key.clone(),
                path,
                backend: tag.to_string(),
                source,
            })
    }

    /// Encodes `embeddings` and publishes them under `key` without
    /// overwriting. An existing file yields [`SaveOutcome::AlreadyExists`].
    pub fn save(
        &self,
        key: &CacheKey,
        embeddings: &Embeddings,
        tag: &str,
    ) -> CacheResult<SaveOutcome> {
        let backend = self.backend(tag)?;
        let path = self.path_for(key, backend.as_ref());

        let bytes = backend
            .encode(embeddings)
            .map_err(|source| CacheError::Encode {
                key: key.clone(),
                backend: tag.to_string(),
                source,
            })?;

        self.ensure_data_dir()?;

        let mut temp =
            NamedTempFile::new_in(&self.data_dir).map_err(|e| CacheError::io(&self.data_dir, e))?;
        temp.write_all(&bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| CacheError::io(temp.path(), e))?;

        match temp.persist_noclobber(&path) {
            Ok(_) => Ok(SaveOutcome::Written),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(SaveOutcome::AlreadyExists)
            }
            Err(e) => Err(CacheError::io(path, e.error)),
        }
    }

    /// Returns the cached vectors for `request`, calling `compute` only when
    /// no file exists yet.
    ///
    /// A lost write race is logged and the freshly computed vectors are
    /// returned anyway.
    pub async fn get_or_compute_with<F, Fut>(
        &self,
        request: &EmbeddingRequest,
        tag: &str,
        compute: F,
    ) -> CacheResult<CacheLookup>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<Embeddings>>,
    {
        request.validate()?;

        let key = CacheKey::derive(request);
        let path = self.entry_path(&key, tag)?;

        if let Some(embeddings) = self.load(&key, tag)? {
            if !embeddings.matches(request) {
                return Err(CacheError::Corrupted {
                    key,
                    path,
                    backend: tag.to_string(),
                    source: BackendError::UnexpectedShape {
                        reason: format!(
                            "stored {} row(s) for a request of {} text(s)",
                            embeddings.rows(),
                            request.len()
                        ),
                    },
                });
            }
            info!(key = %key, path = %path.display(), backend = tag, "loaded");
            return Ok(CacheLookup {
                embeddings,
                outcome: CacheOutcome::Loaded,
                key,
                path,
            });
        }

        debug!(key = %key, backend = tag, "cache miss");
        let embeddings = compute().await?;
        if !embeddings.matches(request) {
            return Err(ProviderError::InvalidResponse {
                reason: format!(
                    "provider returned {} row(s) for a request of {} text(s)",
                    embeddings.rows(),
                    request.len()
                ),
            }
            .into());
        }

        let outcome = match self.save(&key, &embeddings, tag)? {
            SaveOutcome::Written => {
                info!(key = %key, path = %path.display(), backend = tag, "saved");
                CacheOutcome::Saved
            }
            SaveOutcome::AlreadyExists => {
                warn!(
                    key = %key,
                    path = %path.display(),
                    backend = tag,
                    "lost write race, keeping computed value"
                );
                CacheOutcome::RaceLost
            }
        };

        Ok(CacheLookup {
            embeddings,
            outcome,
            key,
            path,
        })
    }

    /// [`get_or_compute_with`](Self::get_or_compute_with) using `provider`
    /// as the compute function.
    pub async fn get_or_compute<P>(
        &self,
        request: &EmbeddingRequest,
        tag: &str,
        provider: &P,
    ) -> CacheResult<CacheLookup>
    where
        P: EmbeddingProvider + ?Sized,
    {
        self.get_or_compute_with(request, tag, || provider.embed(request))
            .await
    }
}
