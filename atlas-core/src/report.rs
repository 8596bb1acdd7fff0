//! Canonical degenerate reports.

/// Report returned when the planner produced no tasks.
pub const NO_TASKS_REPORT: &str = "# Report\n\nPlanner did not produce any tasks.";

/// Report returned when no sub-question produced an answer.
pub const NO_ANSWERS_REPORT: &str = "# Report\n\nNo answers were generated; there may have been \
     issues with web search, scraping, or retrieval.";
