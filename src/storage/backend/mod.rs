//! Pluggable encodings for cached vectors.
//!
//! A backend is identified by its format tag and owns one file extension.
//! [`BackendRegistry`] maps tags to backends so new encodings can be added
//! without touching [`crate::storage::CacheStore`].

mod json;
mod tensor;

pub use json::JsonBackend;
pub use tensor::TensorBackend;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::embedding::Embeddings;
use crate::storage::error::BackendResult;

/// Encodes and decodes [`Embeddings`] to and from bytes.
pub trait SerializationBackend: Send + Sync {
    /// Format tag used to select this backend (e.g. `json`).
    fn tag(&self) -> &str;

    /// File extension, without the dot.
    fn extension(&self) -> &str;

    fn encode(&self, embeddings: &Embeddings) -> BackendResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> BackendResult<Embeddings>;
}

/// Table from format tag to backend.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn SerializationBackend>>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`JsonBackend`] (`json`) and [`TensorBackend`] (`tensor`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonBackend);
        registry.register(TensorBackend);
        registry
    }

    /// Adds `backend` under its tag, replacing any previous entry.
    pub fn register<B>(&mut self, backend: B) -> &mut Self
    where
        B: SerializationBackend + 'static,
    {
        self.backends
            .insert(backend.tag().to_string(), Arc::new(backend));
        self
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn SerializationBackend>> {
        self.backends.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.backends.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
