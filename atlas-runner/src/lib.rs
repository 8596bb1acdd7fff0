//! # atlas-runner
//!
//! The research orchestrator for ATLAS.
//!
//! [`ResearchRunner`] turns a query into a plan, researches each sub-question against the web
//! with a per-run [`EmbeddingIndex`](atlas_rag::EmbeddingIndex), and composes a report from
//! the answers. Progress is observable through [`RunEvent`]s and a run can be stopped with a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) via [`RunControl`].

pub mod event;
pub mod outcome;
pub mod runner;

pub use event::{AbandonReason, RunEvent};
pub use outcome::{RunOutcome, RunStats};
pub use runner::{ResearchRunner, ResearchRunnerBuilder, RunControl};
pub use tokio_util::sync::CancellationToken;
