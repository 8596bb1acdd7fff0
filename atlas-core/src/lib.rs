//! # atlas-core
//!
//! Shared foundation for the ATLAS research pipeline.
//!
//! ## Overview
//!
//! - [`AtlasConfig`] - process-wide configuration, built once and passed by reference
//! - [`AtlasError`] - the error taxonomy, split into recoverable per-item failures and
//!   run-level failures
//! - [`ResearchPlan`], [`Evidence`], [`SubquestionResult`] and friends - the values that flow
//!   through a run
//! - [`Planner`], [`WebSearch`], [`Fetcher`], [`Extractor`], [`Answerer`], [`Critic`],
//!   [`ReportComposer`] - collaborator contracts consumed by the orchestrator
//! - [`decode_lenient`] - best-effort JSON recovery for model output

pub mod config;
pub mod error;
pub mod json;
pub mod plan;
pub mod report;
pub mod traits;
pub mod types;

pub use config::{
    AtlasConfig, EmbeddingBackend, EmbeddingConfig, FetchConfig, LlmConfig, PathsConfig,
    RagConfig, RagConfigBuilder, RunnerConfig, SearchConfig,
};
pub use error::{AtlasError, Result};
pub use json::{UseDefault, decode_lenient};
pub use plan::{ResearchPlan, ResearchTask};
pub use report::{NO_ANSWERS_REPORT, NO_TASKS_REPORT};
pub use traits::{Answerer, Critic, Extractor, Fetcher, Planner, ReportComposer, WebSearch};
pub use types::{
    CleanedDocument, CriticReport, Evidence, SubquestionResult, Verdict, WebResult,
};
