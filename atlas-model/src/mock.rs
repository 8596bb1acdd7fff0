//! Scripted [`Llm`] for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::{ChatRequest, Llm};

/// An [`Llm`] that replays scripted replies and records every request it receives.
///
/// Replies are consumed in order. Once the script runs out, the fallback reply is returned
/// if one was set; otherwise the call fails with [`LlmError::MalformedResponse`].
///
/// # Example
///
/// ```rust,ignore
/// use atlas_model::MockLlm;
///
/// let llm = MockLlm::new(["first reply", "second reply"]);
/// ```
#[derive(Debug, Default)]
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlm {
    /// Create a mock that replies with `replies` in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Default::default()
        }
    }

    /// Reply with `text` whenever the script is exhausted.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Append a failing call to the script.
    pub fn then_error(self, error: LlmError) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
        self
    }

    /// Append a successful reply to the script.
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(text.into()));
        }
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        match next {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| LlmError::MalformedResponse("mock script exhausted".into())),
        }
    }
}
