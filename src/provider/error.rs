use std::time::Duration;

use thiserror::Error;

/// Errors returned by embedding providers and the retry wrapper.
///
/// Only [`ProviderError::RateLimited`] is transient; every other variant is a
/// permanent failure for the request that produced it.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote service asked us to slow down.
    #[error("rate limited{}", retry_after_suffix(.retry_after))]
    RateLimited {
        /// Server-suggested wait before the next attempt, if any.
        retry_after: Option<Duration>,
    },

    /// The remote service rejected the request.
    #[error("API error{}: {message}", status_suffix(.status))]
    Api {
        /// HTTP status, when the failure came from a raw HTTP response.
        status: Option<u16>,
        message: String,
    },

    /// Transport failure, including connect and read timeouts.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// SDK client failure that is not an API response.
    #[error("client error: {reason}")]
    Client { reason: String },

    /// The response could not be turned into [`crate::embedding::Embeddings`].
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// The request cannot be sent as given.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// No API key was supplied.
    #[error("embedding provider not configured: missing API key")]
    NotConfigured,

    /// The retry bound was reached while still rate limited.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Returns `true` for the distinguished throttling signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-suggested wait attached to a rate-limit signal.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(", retry after {}ms", wait.as_millis()),
        None => String::new(),
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

/// Convenience result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
