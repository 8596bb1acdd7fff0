//! Error types for chat-completion clients.

use std::time::Duration;

use atlas_core::AtlasError;
use thiserror::Error;

/// Errors returned by an [`Llm`](crate::Llm).
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider answered HTTP 429.
    #[error("Rate limited by provider{}", retry_hint(.retry_after))]
    RateLimited {
        /// The server's `Retry-After` hint, when it sent one.
        retry_after: Option<Duration>,
    },

    /// The provider answered with a non-success status other than 429.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Status code.
        status: u16,
        /// Error detail from the body, or the raw body.
        message: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("Request failed: {0}")]
    Request(String),

    /// The request did not complete in time.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout {
        /// The configured timeout.
        timeout_secs: u64,
    },

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Every attempt was rate limited.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made, first try included.
        attempts: u32,
        /// The error from the final attempt.
        last: Box<LlmError>,
    },
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default()
}

impl LlmError {
    /// Only rate-limit responses are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Convert into the pipeline error, tagging it with the model name.
    pub fn into_atlas(self, model: &str) -> AtlasError {
        AtlasError::Generation { model: model.to_string(), message: self.to_string() }
    }
}

impl From<LlmError> for AtlasError {
    fn from(err: LlmError) -> Self {
        err.into_atlas("llm")
    }
}
