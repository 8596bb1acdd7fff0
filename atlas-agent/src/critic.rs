//! LLM-backed faithfulness critic.

use std::sync::Arc;

use async_trait::async_trait;
use atlas_core::{Critic, CriticReport, Evidence, Result, Verdict, decode_lenient};
use atlas_model::{ChatRequest, Llm};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::prompt::critic_evidence_block;

/// Total characters of evidence shown to the critic.
pub const DEFAULT_MAX_EVIDENCE_CHARS: usize = 6000;

const SYSTEM_PROMPT: &str = r#"You are the critic agent of ATLAS, an autonomous research assistant.

Decide whether an answer is supported by a set of numbered evidence chunks. Be strict: do not
assume anything the evidence does not state. Anything the answer claims beyond the evidence is
unsupported.

Reply with a single JSON object and nothing else:
{
  "faithfulness_score": <number from 0 to 1>,
  "unsupported_claims": [<string>, ...],
  "verdict": "pass" | "fail",
  "rationale": "<one to four sentences>"
}

A score near 1 means strongly grounded, around 0.5 mixed, near 0 largely unsupported.
List each unsupported sentence or claim, or use [] if there are none.
Use "pass" when the score is at least 0.7, otherwise "fail"."#;

/// Grades an answer against its evidence.
///
/// Model output is decoded field by field: scores may be numbers or numeric strings and are
/// clamped to `[0, 1]`, a non-list `unsupported_claims` becomes a one-element list, and any
/// verdict other than `pass` is `fail`. Output with no decodable object yields
/// [`CriticReport::unparsable`].
pub struct LlmCritic {
    llm: Arc<dyn Llm>,
    max_evidence_chars: usize,
}

impl LlmCritic {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, max_evidence_chars: DEFAULT_MAX_EVIDENCE_CHARS }
    }

    pub fn with_max_evidence_chars(mut self, max_evidence_chars: usize) -> Self {
        self.max_evidence_chars = max_evidence_chars;
        self
    }

    /// Decode model output into a report.
    pub fn parse_report(raw: &str) -> CriticReport {
        match decode_lenient::<Map<String, Value>>(raw) {
            Ok(fields) if !fields.is_empty() => report_from_fields(&fields),
            _ => {
                warn!(raw_len = raw.len(), "critic output was not a JSON object");
                CriticReport::unparsable()
            }
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Null, false, empty strings and empty arrays count as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        _ => true,
    })
}

fn report_from_fields(fields: &Map<String, Value>) -> CriticReport {
    let score = match fields.get("faithfulness_score") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    let faithfulness_score = if score.is_finite() { score.clamp(0.0, 1.0) as f32 } else { 0.0 };

    let unsupported_claims = match present(fields.get("unsupported_claims")) {
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        Some(other) => vec![value_text(other)],
        None => Vec::new(),
    };

    let verdict = match present(fields.get("verdict")) {
        Some(v) if value_text(v).trim().eq_ignore_ascii_case("pass") => Verdict::Pass,
        _ => Verdict::Fail,
    };

    let rationale = present(fields.get("rationale")).map(value_text).unwrap_or_default();

    CriticReport { faithfulness_score, unsupported_claims, verdict, rationale }
}

#[async_trait]
impl Critic for LlmCritic {
    #[instrument(skip(self, answer, evidence), fields(evidence_count = evidence.len()))]
    async fn critique(
        &self,
        question: &str,
        answer: &str,
        evidence: &[Evidence],
    ) -> Result<CriticReport> {
        let user = format!(
            "Question:\n{question}\n\nAnswer:\n{answer}\n\nEvidence chunks (numbered):\n{}\n\n\
             Now return ONLY the JSON object described in the instructions.",
            critic_evidence_block(evidence, self.max_evidence_chars)
        );

        let raw = self
            .llm
            .chat(ChatRequest::new(SYSTEM_PROMPT, user))
            .await
            .map_err(|e| e.into_atlas(self.llm.name()))?;

        let report = Self::parse_report(&raw);
        info!(score = report.faithfulness_score, verdict = %report.verdict, "critique produced");
        Ok(report)
    }
}
