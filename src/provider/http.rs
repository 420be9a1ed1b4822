//! Raw HTTP provider for OpenAI-compatible `/embeddings` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use tracing::debug;

use super::{EmbeddingProvider, ProviderError, ProviderResult, assemble};
use crate::config::ProviderConfig;
use crate::embedding::{EmbeddingRequest, Embeddings};

/// Posts requests to `{base_url}/embeddings` with `reqwest`.
pub struct HttpProvider {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HttpProvider {
    /// Builds a provider whose client enforces `config.request_timeout`.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed(&self, request: &EmbeddingRequest) -> ProviderResult<Embeddings> {
        request.validate()?;

        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::NotConfigured)?;

        debug!(
            model = %self.model,
            texts = request.len(),
            "posting embedding request"
        );

        let body = serde_json::json!({
            "input": request,
            "model": self.model,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: Some(status.as_u16()),
                message,
            });
        }

        let result: EmbeddingsResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        assemble(
            request,
            result
                .data
                .into_iter()
                .map(|item| (item.index, item.embedding))
                .collect(),
        )
    }
}

/// Reads a `retry-after` header given in (possibly fractional) seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
