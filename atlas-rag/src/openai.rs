//! Embedding provider for OpenAI-compatible `/embeddings` endpoints.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use atlas_core::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{EmbeddingProvider, l2_normalize};
use crate::error::{RagError, Result};

const PROVIDER: &str = "OpenAI";

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// The base URL is configurable so self-hosted servers exposing the same wire format work too.
/// The requested dimensionality is sent with every call, and returned vectors are
/// L2-normalised before they leave the provider.
///
/// # Example
///
/// ```rust,ignore
/// use atlas_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?.with_dimensions(384);
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let defaults = EmbeddingConfig::default();
        Self::build(
            api_key.into(),
            defaults.base_url,
            defaults.model,
            defaults.dimensions,
            Duration::from_secs(defaults.request_timeout_secs),
        )
    }

    /// Create a provider from the embedding section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no API key is configured.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            RagError::ConfigError("OpenAI embedding provider requires an API key".into())
        })?;
        Self::build(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            config.dimensions,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn build(
        api_key: String,
        base_url: String,
        model: String,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(RagError::ConfigError("API key must not be empty".into()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!("failed to build HTTP client: {e}"),
            }
        })?;

        Ok(Self { client, api_key, base_url, model, dimensions })
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the requested output dimensions.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Decode a successful response body into unit-length vectors in input order.
fn parse_embeddings(body: &str) -> Result<Vec<Vec<f32>>> {
    let mut response: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| RagError::EmbeddingError {
            provider: PROVIDER.into(),
            message: format!("failed to parse response: {e}"),
        })?;

    response.data.sort_by_key(|d| d.index);
    Ok(response
        .data
        .into_iter()
        .map(|d| {
            let mut embedding = d.embedding;
            l2_normalize(&mut embedding);
            embedding
        })
        .collect())
}

fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingError {
            provider: PROVIDER.into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body =
            EmbeddingRequest { model: &self.model, input: texts.to_vec(), dimensions: self.dimensions };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::EmbeddingError {
                    provider: PROVIDER.into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| RagError::EmbeddingError {
            provider: PROVIDER.into(),
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!("API returned {status}: {}", error_detail(body)),
            });
        }

        parse_embeddings(&body)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
