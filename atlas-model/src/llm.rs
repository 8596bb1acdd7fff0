//! The chat-completion seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation.
    System,
    /// The caller's prompt.
    User,
    /// A model reply.
    Assistant,
}

/// One message in a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A chat-completion request.
///
/// `temperature` and `max_tokens` override the client's configured defaults when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// A two-message request: system instructions followed by the user prompt.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Content of the first user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages.iter().find(|m| m.role == Role::User).map(|m| m.content.as_str())
    }
}

/// A text-generation backend.
///
/// Implementations own their retry behaviour: a returned error means the call has already
/// failed for good.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model identifier, used in logs and errors.
    fn name(&self) -> &str;

    /// Send `request` and return the assistant's reply text.
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError>;
}
