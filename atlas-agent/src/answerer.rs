//! LLM-backed answer generation with inline citations.

use std::sync::Arc;

use async_trait::async_trait;
use atlas_core::{Answerer, Evidence, Result};
use atlas_model::{ChatRequest, Llm};
use tracing::{debug, instrument};

use crate::prompt::answer_evidence_block;

/// Reply used when a question reaches the answerer with no evidence.
pub const NO_EVIDENCE_ANSWER: &str = "I don't have any evidence to answer this question yet.";

/// Characters of each chunk shown to the model.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1200;

const SYSTEM_PROMPT: &str = "You are the answer agent of ATLAS, a research assistant that \
values accuracy over completeness.

You receive a question and numbered evidence chunks taken from web pages.

Rules:
- Use ONLY the evidence provided.
- Cite chunks inline as [1], [2], ... where the number is the chunk's position in the list.
- If the evidence does not answer the question exactly, say so plainly, then give the most \
useful answer the evidence does support. Approximations such as \"about a third\" are allowed \
only when the evidence backs them.
- Never invent numbers, names or facts.

Answer clearly in a few short paragraphs.";

/// Answers a sub-question from retrieved evidence.
pub struct LlmAnswerer {
    llm: Arc<dyn Llm>,
    max_chunk_chars: usize,
}

impl LlmAnswerer {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS }
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }
}

#[async_trait]
impl Answerer for LlmAnswerer {
    #[instrument(skip(self, evidence), fields(evidence_count = evidence.len()))]
    async fn answer(&self, question: &str, evidence: &[Evidence]) -> Result<String> {
        if evidence.is_empty() {
            debug!("no evidence, declining to answer");
            return Ok(NO_EVIDENCE_ANSWER.to_string());
        }

        let user = format!(
            "Question:\n{question}\n\nEvidence chunks:\n{}\n\nAnswer the question with inline \
             citations like [1], [2] referring to the evidence chunks above.",
            answer_evidence_block(evidence, self.max_chunk_chars)
        );

        self.llm
            .chat(ChatRequest::new(SYSTEM_PROMPT, user))
            .await
            .map_err(|e| e.into_atlas(self.llm.name()))
    }
}
