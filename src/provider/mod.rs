//! Remote embedding providers.
//!
//! Every provider answers an [`EmbeddingRequest`] with [`Embeddings`] of the
//! matching shape, or fails with a [`ProviderError`]. Two interchangeable
//! implementations talk to an OpenAI-compatible endpoint:
//!
//! - [`HttpProvider`] posts JSON with `reqwest`.
//! - [`NativeClientProvider`] goes through the `async-openai` SDK.
//!
//! Throttling is reported as [`ProviderError::RateLimited`] and is handled by
//! [`crate::retry::RetryingProvider`], never here.

mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod native;

#[cfg(test)]
mod tests;

pub use error::{ProviderError, ProviderResult};
pub use http::HttpProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::ScriptedProvider;
pub use native::NativeClientProvider;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::embedding::{EmbeddingRequest, Embeddings};

/// Computes embeddings for a request.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Embeds `request`. The result must [`match`](Embeddings::matches) it.
    async fn embed(&self, request: &EmbeddingRequest) -> ProviderResult<Embeddings>;
}

#[async_trait]
impl<P> EmbeddingProvider for Arc<P>
where
    P: EmbeddingProvider + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn embed(&self, request: &EmbeddingRequest) -> ProviderResult<Embeddings> {
        (**self).embed(request).await
    }
}

#[async_trait]
impl<P> EmbeddingProvider for Box<P>
where
    P: EmbeddingProvider + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn embed(&self, request: &EmbeddingRequest) -> ProviderResult<Embeddings> {
        (**self).embed(request).await
    }
}

/// Which concrete provider to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Raw HTTP via `reqwest`.
    #[default]
    Http,
    /// The `async-openai` client.
    Native,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "req" | "requests" => Ok(Self::Http),
            "native" | "sdk" | "openai" => Ok(Self::Native),
            _ => Err(format!("Unknown provider kind: {}", s)),
        }
    }
}

/// Builds the provider selected by `kind`.
pub fn build_provider(
    kind: ProviderKind,
    config: &ProviderConfig,
) -> ProviderResult<Box<dyn EmbeddingProvider>> {
    Ok(match kind {
        ProviderKind::Http => Box::new(HttpProvider::new(config)?),
        ProviderKind::Native => Box::new(NativeClientProvider::new(config)?),
    })
}

/// Assembles `(index, vector)` pairs from a response into the shape `request`
/// expects. Rows are ordered by `index`, not by arrival, and the indices must
/// be exactly `0..n`.
pub(crate) fn assemble(
    request: &EmbeddingRequest,
    mut items: Vec<(usize, Vec<f32>)>,
) -> ProviderResult<Embeddings> {
    if items.len() != request.len() {
        return Err(ProviderError::InvalidResponse {
            reason: format!(
                "expected {} embeddings, got {}",
                request.len(),
                items.len()
            ),
        });
    }

    items.sort_by_key(|(index, _)| *index);

    if let Some((position, (index, _))) = items
        .iter()
        .enumerate()
        .find(|(position, (index, _))| position != index)
    {
        return Err(ProviderError::InvalidResponse {
            reason: format!("embedding at position {position} has index {index}"),
        });
    }

    match request {
        EmbeddingRequest::Single(_) => {
            let (_, vector) = items.pop().ok_or_else(|| ProviderError::InvalidResponse {
                reason: "no embedding in response".to_string(),
            })?;
            Ok(Embeddings::One(vector))
        }
        EmbeddingRequest::Batch(_) => Ok(Embeddings::Many(
            items.into_iter().map(|(_, vector)| vector).collect(),
        )),
    }
}
