//! Value types exchanged between the orchestrator and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A chunk returned by retrieval for a specific query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// 1-based position in the similarity-sorted result set.
    pub rank: usize,
    /// Cosine similarity between the query and the chunk.
    pub score: f32,
    /// Identity of the chunk.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// Where the chunk came from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single web search hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebResult {
    /// Page title.
    pub title: String,
    /// Absolute URL of the page.
    pub url: String,
    /// Short description shown by the search engine.
    #[serde(default)]
    pub snippet: String,
}

/// A document that was fetched, extracted and handed to the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanedDocument {
    /// Source URL.
    pub url: String,
    /// Title from the search result.
    pub title: String,
    /// Extracted readable text.
    pub text: String,
}

/// Critic verdict on an answer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The answer is mostly faithful to its evidence.
    Pass,
    /// The answer is not adequately supported.
    #[default]
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// The critic's faithfulness assessment of an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriticReport {
    /// How well the answer is grounded in its evidence, in `[0, 1]`.
    pub faithfulness_score: f32,
    /// Claims from the answer the evidence does not support.
    pub unsupported_claims: Vec<String>,
    /// Pass/fail verdict.
    pub verdict: Verdict,
    /// Short explanation.
    pub rationale: String,
}

impl CriticReport {
    /// The conservative report used when the critic's output cannot be decoded.
    pub fn unparsable() -> Self {
        Self {
            faithfulness_score: 0.0,
            unsupported_claims: vec!["Critic could not parse the model response as JSON.".into()],
            verdict: Verdict::Fail,
            rationale: "Failed to parse the critic JSON response.".to_string(),
        }
    }
}

/// The record kept for every answered sub-question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubquestionResult {
    /// Id of the owning task.
    pub task_id: String,
    /// Description of the owning task.
    pub task_description: String,
    /// The sub-question text.
    pub subquestion: String,
    /// The cited answer.
    pub answer: String,
    /// Evidence the answer was generated from, in rank order.
    pub evidence: Vec<Evidence>,
    /// Critic assessment, absent when critique is disabled or was not produced.
    pub critic: Option<CriticReport>,
}

impl SubquestionResult {
    /// Distinct evidence URLs in rank order, at most `limit`.
    pub fn source_urls(&self, limit: usize) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        for url in self.evidence.iter().filter_map(|e| e.url.as_deref()) {
            if urls.len() >= limit {
                break;
            }
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}
