//! Contracts for the collaborators the research orchestrator drives.
//!
//! The orchestrator only sees these traits. Implementations live in `atlas-agent` (text
//! generation) and `atlas-tool` (web access); tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::plan::ResearchPlan;
use crate::types::{CriticReport, Evidence, SubquestionResult, WebResult};

/// Breaks a research query into tasks and sub-questions.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce a plan. Unparsable model output yields a fallback plan rather than an error.
    async fn plan(&self, query: &str) -> Result<ResearchPlan>;
}

/// Finds candidate web pages for a sub-question.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Ranked, already-filtered results. May be empty.
    async fn search(&self, query: &str) -> Result<Vec<WebResult>>;
}

/// Downloads raw documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Return the raw body of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Fetch`](crate::AtlasError::Fetch) on network or HTTP failure.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Turns raw documents into readable text.
pub trait Extractor: Send + Sync {
    /// Extract readable text. Returns an empty string when nothing meaningful was found.
    fn extract(&self, raw: &str, url: Option<&str>) -> String;
}

/// Writes a cited answer from retrieved evidence.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Answer `question` citing evidence as `[1]`, `[2]`, ...
    async fn answer(&self, question: &str, evidence: &[Evidence]) -> Result<String>;
}

/// Grades how faithful an answer is to its evidence.
#[async_trait]
pub trait Critic: Send + Sync {
    /// Assess `answer`. Unparsable model output yields [`CriticReport::unparsable`].
    async fn critique(
        &self,
        question: &str,
        answer: &str,
        evidence: &[Evidence],
    ) -> Result<CriticReport>;
}

/// Assembles the final report.
#[async_trait]
pub trait ReportComposer: Send + Sync {
    /// Compose a markdown report. An empty `results` list yields an explicit "no answers"
    /// document.
    async fn compose(
        &self,
        query: &str,
        plan: &ResearchPlan,
        results: &[SubquestionResult],
    ) -> Result<String>;
}
