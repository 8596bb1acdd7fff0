//! Groq chat-completion client.
//!
//! Groq exposes an OpenAI-compatible `/chat/completions` endpoint, so this client works
//! unchanged against any server speaking the same wire format by pointing `base_url` at it.
//!
//! This module is only available when the `groq` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_model::{ChatRequest, GroqClient, Llm};
//!
//! let client = GroqClient::from_config(&config.llm)?;
//! let reply = client.chat(ChatRequest::new("You are terse.", "Define RAG.")).await?;
//! ```

use async_trait::async_trait;
use atlas_core::LlmConfig;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::error::LlmError;
use crate::llm::{ChatMessage, ChatRequest, Llm};
use crate::retry::{RetryPolicy, with_retry};

/// Chat-completion client for Groq and other OpenAI-compatible APIs.
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GroqClient {
    /// Build a client from the text-generation section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Request`] if the API key is empty or the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Request("API key must not be empty".into()));
        }
        let timeout = config.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(&self, body: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        classify_response(status, retry_after, &text)
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout { timeout_secs: self.timeout.as_secs() }
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Map an HTTP status and body to the reply text or an [`LlmError`].
fn classify_response(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> Result<String, LlmError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited { retry_after });
    }
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        return Err(LlmError::Http { status: status.as_u16(), message });
    }

    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::MalformedResponse("response has no message content".into()))
}

#[async_trait]
impl Llm for GroqClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
        };
        debug!(message_count = body.messages.len(), "sending chat completion");

        with_retry(&self.retry, &self.model, || self.send_once(&body)).await.map_err(|e| {
            error!(error = %e, "chat completion failed");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        assert_eq!(classify_response(StatusCode::OK, None, body).unwrap(), "hello");
    }

    #[test]
    fn too_many_requests_is_rate_limited_with_hint() {
        let err =
            classify_response(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(3)), "")
                .unwrap_err();
        assert!(
            matches!(err, LlmError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(3))
        );
    }

    #[test]
    fn error_status_uses_api_message() {
        let body = r#"{"error":{"message":"invalid api key"}}"#;
        match classify_response(StatusCode::UNAUTHORIZED, None, body).unwrap_err() {
            LlmError::Http { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_choices_is_malformed() {
        let err = classify_response(StatusCode::OK, None, r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
        let err = classify_response(StatusCode::OK, None, "<html>").unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn retry_after_accepts_seconds_only() {
        assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn rejects_empty_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(GroqClient::from_config(&config), Err(LlmError::Request(_))));
    }

    #[test]
    fn request_serializes_openai_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = CompletionRequest {
            model: "llama-3.1-8b-instant",
            messages: &messages,
            temperature: 0.3,
            max_tokens: 2048,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 2048);
    }
}
