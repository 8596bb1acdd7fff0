//! Sub-question retrieval against the per-run index.

use std::sync::Arc;

use atlas_core::RagConfig;
use tracing::{debug, instrument};

use crate::document::Evidence;
use crate::error::Result;
use crate::index::EmbeddingIndex;

/// Returns the top-scoring evidence for a sub-question.
///
/// Wraps a shared [`EmbeddingIndex`] with the run's default `top_k` and an optional minimum
/// similarity. Results dropped by the threshold are removed before ranks are reassigned, so
/// ranks stay contiguous from 1.
#[derive(Clone)]
pub struct EvidenceRetriever {
    index: Arc<EmbeddingIndex>,
    top_k: usize,
    similarity_threshold: Option<f32>,
}

impl EvidenceRetriever {
    /// Create a retriever with the given default `top_k` and no threshold.
    pub fn new(index: Arc<EmbeddingIndex>, top_k: usize) -> Self {
        Self { index, top_k, similarity_threshold: None }
    }

    /// Create a retriever using `top_k` and `similarity_threshold` from the configuration.
    pub fn from_config(index: Arc<EmbeddingIndex>, config: &RagConfig) -> Self {
        Self { index, top_k: config.top_k, similarity_threshold: config.similarity_threshold }
    }

    /// Drop evidence scoring below `threshold`.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    /// The default number of results.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    /// Retrieve the default `top_k` evidence chunks for `subquestion`.
    pub async fn retrieve_evidence(&self, subquestion: &str) -> Result<Vec<Evidence>> {
        self.retrieve_evidence_k(subquestion, self.top_k).await
    }

    /// Retrieve at most `k` evidence chunks for `subquestion`.
    #[instrument(skip(self), fields(subquestion.len = subquestion.len()))]
    pub async fn retrieve_evidence_k(&self, subquestion: &str, k: usize) -> Result<Vec<Evidence>> {
        let mut evidence = self.index.retrieve(subquestion, k).await?;

        if let Some(threshold) = self.similarity_threshold {
            let before = evidence.len();
            evidence.retain(|e| e.score >= threshold);
            for (position, item) in evidence.iter_mut().enumerate() {
                item.rank = position + 1;
            }
            debug!(threshold, dropped = before - evidence.len(), "applied similarity threshold");
        }

        Ok(evidence)
    }
}
