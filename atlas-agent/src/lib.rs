//! # atlas-agent
//!
//! LLM-backed collaborators for the ATLAS research pipeline.
//!
//! Each agent wraps an [`atlas_model::Llm`] and implements one of the contracts from
//! `atlas-core`:
//!
//! - [`LlmPlanner`] - [`Planner`](atlas_core::Planner): query to research plan, with a
//!   single-task fallback for unparsable output
//! - [`LlmAnswerer`] - [`Answerer`](atlas_core::Answerer): cited answers from numbered evidence
//! - [`LlmCritic`] - [`Critic`](atlas_core::Critic): faithfulness grading with defensive decoding
//! - [`LlmReportComposer`] - [`ReportComposer`](atlas_core::ReportComposer): the final
//!   markdown report
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use atlas_agent::{LlmAnswerer, LlmPlanner};
//! use atlas_model::GroqClient;
//!
//! let llm = Arc::new(GroqClient::from_config(&config.llm)?);
//! let planner = LlmPlanner::new(llm.clone());
//! let answerer = LlmAnswerer::new(llm);
//! ```

pub mod answerer;
pub mod composer;
pub mod critic;
pub mod planner;
pub mod prompt;

pub use answerer::{LlmAnswerer, NO_EVIDENCE_ANSWER};
pub use composer::{ComposerLimits, LlmReportComposer};
pub use critic::LlmCritic;
pub use planner::LlmPlanner;
