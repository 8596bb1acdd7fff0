//! # atlas-cli
//!
//! Wiring and helpers behind the `atlas` binary: argument parsing, construction of the
//! pipeline from an [`AtlasConfig`], progress rendering, and report file naming.

pub mod args;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use atlas_agent::{LlmAnswerer, LlmCritic, LlmPlanner, LlmReportComposer};
use atlas_core::{AtlasConfig, EmbeddingBackend, EmbeddingConfig, Result};
use atlas_model::Llm;
use atlas_rag::{EmbeddingProvider, HashingEmbeddingProvider, OpenAIEmbeddingProvider};
use atlas_runner::{ResearchRunner, RunEvent};
use atlas_tool::{ArtifactStore, DuckDuckGoSearch, HtmlExtractor, HttpFetcher};
use chrono::{DateTime, TimeZone};
use tracing::info;

pub use args::{Cli, EmbeddingArg};

/// Longest slug used in a report file name.
pub const MAX_SLUG_CHARS: usize = 60;

/// Lower-case `text`, collapse runs of non-alphanumerics to `-`, and trim dashes.
///
/// Returns `report` when nothing usable is left.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() { "report".to_string() } else { slug.to_string() }
}

/// `<slug>-<YYYYmmdd-HHMMSS>.md` for `query` at `now`.
pub fn report_file_name<Tz: TimeZone>(query: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}-{}.md", slugify(query), now.format("%Y%m%d-%H%M%S"))
}

/// Write `report` under `dir`, creating it if needed, and return the file path.
pub fn save_report<Tz: TimeZone>(
    dir: &Path,
    query: &str,
    report: &str,
    now: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(query, now));
    std::fs::write(&path, report)?;
    info!(path = %path.display(), bytes = report.len(), "report saved");
    Ok(path)
}

/// Build the embedding backend selected in `config`.
///
/// # Errors
///
/// Fails when the OpenAI backend is selected without an API key.
pub fn build_embedding_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbeddingProvider::new(config.dimensions))),
        EmbeddingBackend::OpenAI => Ok(Arc::new(OpenAIEmbeddingProvider::from_config(config)?)),
    }
}

/// Assemble a [`ResearchRunner`] from `config`, sharing `llm` across every agent.
pub fn build_runner(config: &AtlasConfig, llm: Arc<dyn Llm>) -> Result<ResearchRunner> {
    let artifacts = ArtifactStore::from_config(&config.paths);
    let search = DuckDuckGoSearch::new(config.search.clone(), &config.fetch.user_agent)?;
    let fetcher = HttpFetcher::new(&config.fetch)?.with_artifacts(artifacts.clone());
    let extractor = HtmlExtractor::new()?.with_artifacts(artifacts);

    ResearchRunner::builder()
        .planner(Arc::new(LlmPlanner::new(Arc::clone(&llm))))
        .search(Arc::new(search))
        .fetcher(Arc::new(fetcher))
        .extractor(Arc::new(extractor))
        .embedding_provider(build_embedding_provider(&config.embedding)?)
        .answerer(Arc::new(LlmAnswerer::new(Arc::clone(&llm))))
        .critic(Arc::new(LlmCritic::new(Arc::clone(&llm))))
        .composer(Arc::new(LlmReportComposer::new(llm)))
        .rag_config(config.rag.clone())
        .runner_config(config.runner.clone())
        .build()
}

/// One progress line for `event`.
pub fn render_event(event: &RunEvent) -> String {
    match event {
        RunEvent::PlanReady { task_count, subquestion_count } => {
            format!("plan: {task_count} tasks, {subquestion_count} sub-questions")
        }
        RunEvent::TaskStarted { task_id, description } => format!("[{task_id}] {description}"),
        RunEvent::SubquestionStarted { subquestion, .. } => format!("  ? {subquestion}"),
        RunEvent::SearchResults { count, .. } => format!("    search: {count} results"),
        RunEvent::DocumentIndexed { url, chunks, .. } => {
            format!("    indexed {url} ({chunks} chunks)")
        }
        RunEvent::DocumentSkipped { url, reason } => format!("    skipped {url}: {reason}"),
        RunEvent::EvidenceRetrieved { count, .. } => format!("    evidence: {count} chunks"),
        RunEvent::AnswerProduced { .. } => "    answered".to_string(),
        RunEvent::CritiqueProduced { verdict, score, .. } => {
            format!("    critic: {verdict} ({score:.2})")
        }
        RunEvent::SubquestionAbandoned { reason, .. } => format!("    abandoned: {reason}"),
        RunEvent::Composing { result_count } => format!("composing report from {result_count} answers"),
        RunEvent::Finished { cancelled: true } => "finished (cancelled)".to_string(),
        RunEvent::Finished { cancelled: false } => "finished".to_string(),
    }
}
