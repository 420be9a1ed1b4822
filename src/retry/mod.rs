//! Rate-limit aware retries around an [`EmbeddingProvider`].
//!
//! [`RetryingProvider`] re-issues a call only when the failure satisfies its
//! predicate (by default [`ProviderError::is_rate_limited`]). Every other
//! failure is returned unchanged on the first attempt.

mod config;


pub use config::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_RETRIES, DEFAULT_MULTIPLIER,
    JITTER_FRACTION, RetryConfig,
};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::embedding::{EmbeddingRequest, Embeddings};
use crate::provider::{EmbeddingProvider, ProviderError, ProviderResult};

/// Decides whether a failure is worth another attempt.
pub type RetryPredicate = Arc<dyn Fn(&ProviderError) -> bool + Send + Sync>;

/// Wraps `provider` so failures matching `should_retry` back off and retry.
pub fn wrap<P, F>(provider: P, should_retry: F) -> RetryingProvider<P>
where
    P: EmbeddingProvider,
    F: Fn(&ProviderError) -> bool + Send + Sync + 'static,
{
    RetryingProvider::new(provider, RetryConfig::default()).with_predicate(should_retry)
}

/// Provider decorator implementing exponential backoff.
pub struct RetryingProvider<P> {
    inner: P,
    config: RetryConfig,
    should_retry: RetryPredicate,
}

impl<P> RetryingProvider<P>
where
    P: EmbeddingProvider,
{
    /// Retries rate-limit signals from `inner` according to `config`.
    pub fn new(inner: P, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            should_retry: Arc::new(ProviderError::is_rate_limited),
        }
    }

    /// Replaces the retry predicate.
    pub fn with_predicate<F>(mut self, should_retry: F) -> Self
    where
        F: Fn(&ProviderError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(should_retry);
        self
    }

    /// Replaces the backoff policy.
    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

/// Per-call bookkeeping; dropped when the call returns.
#[derive(Debug, Default)]
struct RetryState {
    attempts: u32,
    waited: Duration,
}

#[async_trait]
impl<P> EmbeddingProvider for RetryingProvider<P>
where
    P: EmbeddingProvider,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn embed(&self, request: &EmbeddingRequest) -> ProviderResult<Embeddings> {
        let mut state = RetryState::default();

        loop {
            state.attempts += 1;

            let error = match self.inner.embed(request).await {
                Ok(embeddings) => {
                    if state.attempts > 1 {
                        debug!(
                            provider = self.inner.name(),
                            attempts = state.attempts,
                            waited_ms = state.waited.as_millis() as u64,
                            "retry succeeded"
                        );
                    }
                    return Ok(embeddings);
                }
                Err(error) => error,
            };

            if !(self.should_retry)(&error) {
                return Err(error);
            }

            let retry = state.attempts;
            if self.config.exhausted(retry - 1) {
                warn!(
                    provider = self.inner.name(),
                    attempts = state.attempts,
                    "giving up after repeated rate limiting"
                );
                return Err(ProviderError::RetriesExhausted {
                    attempts: state.attempts,
                    last: Box::new(error),
                });
            }

            let delay = self
                .config
                .jittered(self.config.delay_for(retry, error.retry_after()));

            warn!(
                provider = self.inner.name(),
                attempt = retry,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "backing off"
            );

            tokio::time::sleep(delay).await;
            state.waited += delay;
        }
    }
}
