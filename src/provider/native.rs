//! Provider backed by the `async-openai` SDK client.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use tracing::debug;

use super::{EmbeddingProvider, ProviderError, ProviderResult, assemble};
use crate::config::ProviderConfig;
use crate::embedding::{EmbeddingRequest, Embeddings};

/// Error `type`/`code` strings the OpenAI API uses for throttling.
const RATE_LIMIT_MARKERS: &[&str] = &["rate_limit_exceeded", "requests", "tokens"];

/// Calls the embeddings endpoint through [`async_openai::Client`].
pub struct NativeClientProvider {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl NativeClientProvider {
    /// Builds a client for `config`. Without an API key the provider still
    /// constructs, but every call fails with [`ProviderError::NotConfigured`].
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = match config.api_key.as_deref() {
            Some(key) => {
                let http = reqwest::Client::builder()
                    .timeout(config.request_timeout)
                    .connect_timeout(config.request_timeout)
                    .build()?;
                let openai_config = OpenAIConfig::new()
                    .with_api_key(key)
                    .with_api_base(config.api_base.trim_end_matches('/'));
                Some(
                    Client::with_config(openai_config)
                        .with_http_client(http)
                        .with_backoff(no_sdk_retries()),
                )
            }
            None => None,
        };

        Ok(Self {
            client,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for NativeClientProvider {
    fn name(&self) -> &str {
        "native"
    }

    async fn embed(&self, request: &EmbeddingRequest) -> ProviderResult<Embeddings> {
        request.validate()?;

        let client = self.client.as_ref().ok_or(ProviderError::NotConfigured)?;

        let input = match request {
            EmbeddingRequest::Single(text) => EmbeddingInput::String(text.clone()),
            EmbeddingRequest::Batch(texts) => EmbeddingInput::StringArray(texts.clone()),
        };

        let sdk_request = CreateEmbeddingRequestArgs::default()
            .model(self.model.as_str())
            .input(input)
            .build()
            .map_err(|e| ProviderError::InvalidRequest {
                reason: e.to_string(),
            })?;

        debug!(
            model = %self.model,
            texts = request.len(),
            "sending embedding request via SDK"
        );

        let response = client
            .embeddings()
            .create(sdk_request)
            .await
            .map_err(map_openai_error)?;

        assemble(
            request,
            response
                .data
                .into_iter()
                .map(|item| (item.index as usize, item.embedding))
                .collect(),
        )
    }
}

/// Rate limits must surface as [`ProviderError::RateLimited`] so that
/// [`crate::retry::RetryingProvider`] owns the backoff, not the SDK.
fn no_sdk_retries() -> backoff::ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Translates SDK failures into the provider taxonomy.
fn map_openai_error(err: OpenAIError) -> ProviderError {
    match err {
        OpenAIError::ApiError(api) => {
            if is_rate_limit(api.r#type.as_deref(), &api.message) {
                ProviderError::RateLimited { retry_after: None }
            } else {
                ProviderError::Api {
                    status: None,
                    message: api.message,
                }
            }
        }
        OpenAIError::Reqwest(e) => ProviderError::Http(e),
        other => ProviderError::Client {
            reason: other.to_string(),
        },
    }
}

fn is_rate_limit(error_type: Option<&str>, message: &str) -> bool {
    error_type.is_some_and(|t| RATE_LIMIT_MARKERS.contains(&t))
        || message.to_ascii_lowercase().starts_with("rate limit")
}
