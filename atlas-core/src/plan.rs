//! The research plan produced by the planner.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A structured research plan: an overall goal broken into tasks of sub-questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResearchPlan {
    /// The (possibly refined) user query.
    #[serde(default, deserialize_with = "lenient_string")]
    pub overall_goal: String,
    /// Tasks in execution order.
    #[serde(default, deserialize_with = "lenient_tasks")]
    pub tasks: Vec<ResearchTask>,
}

/// One research task and the sub-questions that make it up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResearchTask {
    /// Short task identifier such as `t1`. Numeric ids are accepted and stringified.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    /// What the task is about.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Atomic questions answered independently.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub subquestions: Vec<String>,
    /// Kinds of documents worth reading (blog posts, papers, news...).
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub document_types: Vec<String>,
}

impl ResearchPlan {
    /// The single-task plan used when the planner output cannot be decoded.
    ///
    /// The task researches the query itself so the run still produces evidence.
    pub fn fallback_for(query: &str) -> Self {
        Self {
            overall_goal: query.to_string(),
            tasks: vec![ResearchTask {
                id: "t1".to_string(),
                description: "Fallback single task based on the query.".to_string(),
                subquestions: vec![query.to_string()],
                document_types: Vec::new(),
            }],
        }
    }

    /// Whether the plan has no tasks at all.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Total number of sub-questions across all tasks.
    pub fn subquestion_count(&self) -> usize {
        self.tasks.iter().map(|t| t.subquestions.len()).sum()
    }
}

impl ResearchTask {
    /// The id to report, `?` when the planner left it blank.
    pub fn display_id(&self) -> &str {
        if self.id.trim().is_empty() { "?" } else { &self.id }
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value).unwrap_or_default())
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items.into_iter().filter_map(value_to_string).collect(),
        Value::Null => Vec::new(),
        single => value_to_string(single).into_iter().collect(),
    };
    Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

fn lenient_tasks<'de, D>(deserializer: D) -> Result<Vec<ResearchTask>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    // Entries that are not task objects are dropped rather than failing the whole plan.
    Ok(items.into_iter().filter_map(|item| serde_json::from_value(item).ok()).collect())
}
