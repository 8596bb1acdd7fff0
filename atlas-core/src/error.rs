//! Error types shared across the ATLAS crates.

use thiserror::Error;

/// Errors that can occur anywhere in a research run.
///
/// Variants fall into two groups. Per-item failures ([`Fetch`](AtlasError::Fetch),
/// [`Search`](AtlasError::Search), [`Embedding`](AtlasError::Embedding)) are recovered by the
/// orchestrator by skipping the affected item. Everything else terminates the run.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A text-generation call failed after the client exhausted its retries.
    #[error("Generation error ({model}): {message}")]
    Generation {
        /// The model that was being called.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// Downloading a single URL failed.
    #[error("Fetch error ({url}): {message}")]
    Fetch {
        /// The URL that could not be fetched.
        url: String,
        /// A description of the failure.
        message: String,
    },

    /// The web search backend failed.
    #[error("Search error: {0}")]
    Search(String),

    /// The embedding service failed.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Too many per-item failures were recovered during one run.
    #[error("Error budget exhausted: {failures} recovered failures exceed the budget of {budget}")]
    ErrorBudgetExhausted {
        /// Failures observed so far.
        failures: usize,
        /// The configured budget.
        budget: usize,
    },

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AtlasError {
    /// Whether the orchestrator may recover from this error by skipping the affected item.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Search(_) | Self::Embedding { .. })
    }
}

/// A convenience result type for ATLAS operations.
pub type Result<T> = std::result::Result<T, AtlasError>;
