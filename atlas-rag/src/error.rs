//! Error types for the `atlas-rag` crate.

use atlas_core::AtlasError;
use thiserror::Error;

/// Errors that can occur while indexing or retrieving evidence.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding service failed or returned an unusable response.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider returned a vector whose length differs from the index dimensionality.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality fixed at index construction.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Whether this error means the embedding service could not produce usable vectors.
    pub fn is_embedding_failure(&self) -> bool {
        matches!(self, Self::EmbeddingError { .. } | Self::DimensionMismatch { .. })
    }
}

impl From<RagError> for AtlasError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::EmbeddingError { provider, message } => {
                AtlasError::Embedding { provider, message }
            }
            err @ RagError::DimensionMismatch { .. } => {
                AtlasError::Embedding { provider: "index".to_string(), message: err.to_string() }
            }
            RagError::ConfigError(message) => AtlasError::Config(message),
        }
    }
}

impl From<AtlasError> for RagError {
    fn from(err: AtlasError) -> Self {
        match err {
            AtlasError::Embedding { provider, message } => Self::EmbeddingError { provider, message },
            AtlasError::Config(message) => Self::ConfigError(message),
            other => Self::EmbeddingError { provider: "unknown".to_string(), message: other.to_string() },
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
