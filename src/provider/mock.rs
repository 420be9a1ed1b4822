//! Scripted in-memory provider for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{EmbeddingProvider, ProviderError, ProviderResult};
use crate::embedding::{EmbeddingRequest, Embeddings};

/// Provider that replays scripted failures, then returns deterministic vectors.
///
/// Vectors are derived from each text with BLAKE3's extendable output, so the
/// same text always yields the same vector and different texts differ.
pub struct ScriptedProvider {
    dimension: usize,
    failures: Mutex<VecDeque<ProviderError>>,
    requests: Mutex<Vec<EmbeddingRequest>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Creates a provider producing `dimension`-length vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queues `error` to be returned by the next unanswered call.
    pub fn fail_with(self, error: ProviderError) -> Self {
        self.failures.lock().push_back(error);
        self
    }

    /// Queues `times` rate-limit signals.
    pub fn rate_limited(self, times: usize) -> Self {
        {
            let mut failures = self.failures.lock();
            for _ in 0..times {
                failures.push_back(ProviderError::RateLimited { retry_after: None });
            }
        }
        self
    }

    /// Number of `embed` calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in call order.
    pub fn requests(&self) -> Vec<EmbeddingRequest> {
        self.requests.lock().clone()
    }

    /// The vector this provider returns for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        deterministic_vector(text, self.dimension)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn embed(&self, request: &EmbeddingRequest) -> ProviderResult<Embeddings> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }

        request.validate()?;

        Ok(match request {
            EmbeddingRequest::Single(text) => Embeddings::One(self.vector_for(text)),
            EmbeddingRequest::Batch(texts) => {
                Embeddings::Many(texts.iter().map(|t| self.vector_for(t)).collect())
            }
        })
    }
}

fn deterministic_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut bytes = vec![0u8; dimension];
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    hasher.finalize_xof().fill(&mut bytes);
    bytes.iter().map(|&b| f32::from(b) / 127.5 - 1.0).collect()
}
