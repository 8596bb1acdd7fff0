//! Command-line arguments.

use std::path::PathBuf;

use atlas_core::{AtlasConfig, EmbeddingBackend};
use clap::{Parser, ValueEnum};

/// Embedding backend selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingArg {
    Hashing,
    Openai,
}

impl From<EmbeddingArg> for EmbeddingBackend {
    fn from(arg: EmbeddingArg) -> Self {
        match arg {
            EmbeddingArg::Hashing => EmbeddingBackend::Hashing,
            EmbeddingArg::Openai => EmbeddingBackend::OpenAI,
        }
    }
}

/// Research a question on the web and write a cited report.
#[derive(Debug, Parser)]
#[command(name = "atlas", version, about)]
pub struct Cli {
    /// The research query.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Run the full pipeline. Without it only the research plan is printed.
    #[arg(long)]
    pub with_search: bool,

    /// Search results kept per sub-question.
    #[arg(long, value_name = "N")]
    pub max_results: Option<usize>,

    /// Evidence chunks retrieved per sub-question.
    #[arg(long, value_name = "K")]
    pub top_k: Option<usize>,

    /// Only log warnings and do not print progress or the report.
    #[arg(long, short)]
    pub quiet: bool,

    /// Skip faithfulness grading.
    #[arg(long)]
    pub no_critic: bool,

    /// Embedding backend.
    #[arg(long, value_enum)]
    pub embedding: Option<EmbeddingArg>,

    /// Where the report is written (defaults to ATLAS_REPORTS_DIR or `reports`).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log JSON lines instead of human-readable text.
    #[arg(long)]
    pub json_logs: bool,

    /// Print per-stage timings when the run finishes.
    #[arg(long)]
    pub timings: bool,
}

impl Cli {
    /// The query words joined by single spaces.
    pub fn query_text(&self) -> String {
        self.query.join(" ").trim().to_string()
    }

    /// Apply flag overrides on top of the environment configuration.
    pub fn apply(&self, config: &mut AtlasConfig) {
        if let Some(max_results) = self.max_results {
            config.search.max_results = max_results;
        }
        if let Some(top_k) = self.top_k {
            config.rag.top_k = top_k;
        }
        if self.no_critic {
            config.runner.use_critic = false;
        }
        if let Some(embedding) = self.embedding {
            config.embedding.provider = embedding.into();
        }
        if let Some(dir) = &self.output_dir {
            config.paths.reports_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_words_are_joined() {
        let cli = Cli::try_parse_from(["atlas", "how", "do", "tides", "work?"]).unwrap();
        assert_eq!(cli.query_text(), "how do tides work?");
        assert!(!cli.with_search);
    }

    #[test]
    fn query_is_required() {
        assert!(Cli::try_parse_from(["atlas", "--with-search"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "atlas",
            "--with-search",
            "--max-results",
            "3",
            "--top-k",
            "7",
            "--no-critic",
            "--embedding",
            "openai",
            "--output-dir",
            "/tmp/out",
            "q",
        ])
        .unwrap();
        let mut config = AtlasConfig::default();
        cli.apply(&mut config);

        assert!(cli.with_search);
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.rag.top_k, 7);
        assert!(!config.runner.use_critic);
        assert_eq!(config.embedding.provider, EmbeddingBackend::OpenAI);
        assert_eq!(config.paths.reports_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn absent_flags_keep_defaults() {
        let cli = Cli::try_parse_from(["atlas", "q"]).unwrap();
        let mut config = AtlasConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, AtlasConfig::default());
    }
}
