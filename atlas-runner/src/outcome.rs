//! What a run returns.

use atlas_core::{ResearchPlan, SubquestionResult};
use serde::Serialize;
use uuid::Uuid;

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Tasks in the plan.
    pub tasks: usize,
    /// Sub-questions attempted.
    pub subquestions: usize,
    /// Sub-questions that produced a result.
    pub answered: usize,
    /// Sub-questions abandoned before answering.
    pub abandoned: usize,
    /// Documents successfully indexed.
    pub documents_indexed: usize,
    /// Chunks appended to the index.
    pub chunks_indexed: usize,
    /// Recovered per-item failures (fetch, embedding, search, critic).
    pub item_failures: usize,
}

/// The result of [`ResearchRunner::run`](crate::ResearchRunner::run).
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub query: String,
    pub plan: ResearchPlan,
    /// Answered sub-questions in plan order.
    pub results: Vec<SubquestionResult>,
    /// The final markdown report.
    pub report: String,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
    pub stats: RunStats,
}
