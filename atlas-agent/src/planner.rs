//! LLM-backed research planner.

use std::sync::Arc;

use async_trait::async_trait;
use atlas_core::{Planner, ResearchPlan, Result, decode_lenient};
use atlas_model::{ChatRequest, Llm};
use tracing::{info, instrument, warn};

const SYSTEM_PROMPT: &str = r#"You are the planning agent of ATLAS, an autonomous research assistant.

Break the user's research query into a small number of research tasks. For every task give:
- id: a short string such as "t1"
- description: what the task investigates
- subquestions: specific, self-contained questions that can be answered from web sources
- document_types: the kinds of sources worth reading (e.g. "news", "academic papers", "docs")

Reply with JSON only, using exactly this shape:

{
  "overall_goal": "<the user query, optionally refined>",
  "tasks": [
    {
      "id": "t1",
      "description": "...",
      "subquestions": ["...", "..."],
      "document_types": ["...", "..."]
    }
  ]
}"#;

/// Asks a model for a [`ResearchPlan`] and decodes it leniently.
///
/// Output that cannot be decoded at all becomes [`ResearchPlan::fallback_for`] the query.
/// Generation failures are returned as errors.
pub struct LlmPlanner {
    llm: Arc<dyn Llm>,
}

impl LlmPlanner {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Decode model output into a plan, falling back to a single task for `query`.
    pub fn parse_plan(raw: &str, query: &str) -> ResearchPlan {
        decode_lenient::<ResearchPlan>(raw).unwrap_or_else(|_| {
            warn!(raw_len = raw.len(), "planner output was not valid JSON; using fallback plan");
            ResearchPlan::fallback_for(query)
        })
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    #[instrument(skip(self), fields(model = %self.llm.name()))]
    async fn plan(&self, query: &str) -> Result<ResearchPlan> {
        let request = ChatRequest::new(
            SYSTEM_PROMPT,
            format!("Create a research plan for this query:\n{query}"),
        );
        let raw = self.llm.chat(request).await.map_err(|e| e.into_atlas(self.llm.name()))?;

        let plan = Self::parse_plan(&raw, query);
        info!(
            task_count = plan.tasks.len(),
            subquestion_count = plan.subquestion_count(),
            "plan ready"
        );
        Ok(plan)
    }
}
