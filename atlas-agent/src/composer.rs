//! LLM-backed markdown report composition.

use std::sync::Arc;

use async_trait::async_trait;
use atlas_core::{NO_ANSWERS_REPORT, ReportComposer, ResearchPlan, Result, SubquestionResult};
use atlas_model::{ChatRequest, Llm};
use tracing::{info, instrument};

use crate::prompt::truncate_with_note;

const SYSTEM_PROMPT: &str = r#"You are the report composer of ATLAS, an autonomous research assistant.

You receive the user's query, the research plan, and the answers found for each sub-question
together with their sources. Write a well-structured MARKDOWN research report with, in order:

# <short, clear title>
## Abstract - one short paragraph
## Introduction - the question and its context
## Findings - one ### subsection per major theme or task, summarising the relevant answers with
   short paragraphs and bullet lists; add a markdown table where a comparison is natural
## Risks, Limitations, and Uncertainties - where evidence is thin, conflicting or speculative
## Conclusion - one to three paragraphs answering the overall query
## References - deduplicated bullet list of the sources

Stay faithful to the answers and evidence. Do not invent statistics or facts; it is fine to
write that research did not find strong evidence on a point. Never include raw JSON or internal
data structures. Keep a neutral, analytic tone."#;

/// Size limits for the composer prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerLimits {
    /// Characters of plan JSON.
    pub max_plan_chars: usize,
    /// Characters per answer.
    pub max_answer_chars: usize,
    /// Characters of the whole answers block.
    pub max_answers_block_chars: usize,
    /// Answers included, in order.
    pub max_answers: usize,
    /// Distinct evidence URLs listed per answer.
    pub max_urls_per_answer: usize,
}

impl Default for ComposerLimits {
    fn default() -> Self {
        Self {
            max_plan_chars: 4000,
            max_answer_chars: 1200,
            max_answers_block_chars: 12000,
            max_answers: 20,
            max_urls_per_answer: 3,
        }
    }
}

/// Writes the final report from the accumulated sub-question results.
///
/// With no results the model is not called and [`NO_ANSWERS_REPORT`] is returned.
pub struct LlmReportComposer {
    llm: Arc<dyn Llm>,
    limits: ComposerLimits,
}

impl LlmReportComposer {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, limits: ComposerLimits::default() }
    }

    pub fn with_limits(mut self, limits: ComposerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The per-answer summary block sent to the model.
    pub fn answers_block(&self, results: &[SubquestionResult]) -> String {
        let entries: Vec<String> = results
            .iter()
            .take(self.limits.max_answers)
            .enumerate()
            .map(|(i, result)| self.answer_entry(i + 1, result))
            .collect();

        truncate_with_note(
            &entries.join("\n"),
            self.limits.max_answers_block_chars,
            "overall answers block",
        )
    }

    fn answer_entry(&self, number: usize, result: &SubquestionResult) -> String {
        let task_id = if result.task_id.trim().is_empty() { "?" } else { result.task_id.as_str() };
        let answer = truncate_with_note(
            result.answer.trim(),
            self.limits.max_answer_chars,
            "answer text for this subquestion",
        );
        let critic = match &result.critic {
            Some(c) => format!("{:.2} (verdict: {})", c.faithfulness_score, c.verdict),
            None => "n/a (critique not run)".to_string(),
        };
        let sources: String = result
            .source_urls(self.limits.max_urls_per_answer)
            .iter()
            .map(|url| format!("  - {url}\n"))
            .collect();

        format!(
            "### Answer {number}\n- Task: {task_id}: {}\n- Subquestion: {}\n- Answer (with inline \
             citations):\n{answer}\n- Critic faithfulness score: {critic}\n- Evidence \
             sources:\n{sources}",
            result.task_description.trim(),
            result.subquestion.trim(),
        )
    }
}

#[async_trait]
impl ReportComposer for LlmReportComposer {
    #[instrument(skip(self, plan, results), fields(result_count = results.len()))]
    async fn compose(
        &self,
        query: &str,
        plan: &ResearchPlan,
        results: &[SubquestionResult],
    ) -> Result<String> {
        if results.is_empty() {
            info!("no answers to compose");
            return Ok(NO_ANSWERS_REPORT.to_string());
        }

        let plan_json = truncate_with_note(
            &serde_json::to_string_pretty(plan)?,
            self.limits.max_plan_chars,
            "research plan JSON",
        );
        let user = format!(
            "User query:\n{query}\n\nResearch plan (JSON, possibly truncated):\n{plan_json}\n\n\
             Subquestion answers and evidence (possibly truncated):\n\n{}\n\n\
             Now write the final markdown research report as specified.",
            self.answers_block(results)
        );

        let report = self
            .llm
            .chat(ChatRequest::new(SYSTEM_PROMPT, user))
            .await
            .map_err(|e| e.into_atlas(self.llm.name()))?;
        info!(report_len = report.len(), "report composed");
        Ok(report)
    }
}
