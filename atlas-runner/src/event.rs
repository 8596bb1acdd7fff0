//! Progress events emitted during a run.

use std::fmt;

use atlas_core::Verdict;
use serde::Serialize;

/// Why a sub-question produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
    /// Search returned nothing.
    NoSearchResults,
    /// Search failed.
    SearchFailed,
    /// No candidate page could be fetched, extracted and indexed.
    NoDocuments,
    /// Retrieval returned no evidence or failed.
    NoEvidence,
    /// The run was cancelled while the sub-question was in flight.
    Cancelled,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoSearchResults => "no search results",
            Self::SearchFailed => "search failed",
            Self::NoDocuments => "no documents indexed",
            Self::NoEvidence => "no evidence retrieved",
            Self::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// A step of a research run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    PlanReady { task_count: usize, subquestion_count: usize },
    TaskStarted { task_id: String, description: String },
    SubquestionStarted { task_id: String, subquestion: String },
    SearchResults { subquestion: String, count: usize },
    DocumentIndexed { url: String, title: String, chunks: usize },
    DocumentSkipped { url: String, reason: String },
    EvidenceRetrieved { subquestion: String, count: usize },
    AnswerProduced { subquestion: String },
    CritiqueProduced { subquestion: String, verdict: Verdict, score: f32 },
    SubquestionAbandoned { subquestion: String, reason: AbandonReason },
    Composing { result_count: usize },
    Finished { cancelled: bool },
}
