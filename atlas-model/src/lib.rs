//! # atlas-model
//!
//! Chat-completion clients for the ATLAS research pipeline.
//!
//! ## Overview
//!
//! - [`Llm`] - the async text-generation seam every LLM-backed collaborator talks to
//! - `GroqClient` - Groq / OpenAI-compatible `/chat/completions` client (feature `groq`)
//! - [`MockLlm`] - scripted replies for tests
//! - [`RetryPolicy`] / [`with_retry`] - exponential backoff for rate-limited calls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atlas_model::{ChatRequest, GroqClient, Llm};
//!
//! let config = atlas_core::AtlasConfig::from_env()?;
//! let llm = GroqClient::from_config(&config.llm)?;
//! let text = llm.chat(ChatRequest::new("You are a research planner.", "Plan: ...")).await?;
//! ```
//!
//! Only HTTP 429 responses are retried. The delay is `base * 2^attempt` capped at 32 seconds,
//! or the server's `Retry-After` when that is longer.

pub mod error;
#[cfg(feature = "groq")]
pub mod groq;
pub mod llm;
pub mod mock;
pub mod retry;

pub use error::LlmError;
#[cfg(feature = "groq")]
pub use groq::GroqClient;
pub use llm::{ChatMessage, ChatRequest, Llm, Role};
pub use mock::MockLlm;
pub use retry::{MAX_BACKOFF, RetryPolicy, with_retry};
