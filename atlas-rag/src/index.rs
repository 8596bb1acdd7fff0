//! Ephemeral, append-only evidence index.
//!
//! [`EmbeddingIndex`] stores chunks in a flat arena and their unit-length vectors in a parallel
//! row-major matrix: row *i* always belongs to `chunks[i]`. Both grow together under a single
//! `tokio::sync::RwLock` write guard, so concurrent `add_document` calls can never interleave a
//! chunk with someone else's vector. There is no deletion and no persistence; one index lives
//! for exactly one research run.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::chunking::Chunker;
use crate::document::{Chunk, Evidence};
use crate::embedding::{EmbeddingProvider, l2_normalize};
use crate::error::{RagError, Result};

#[derive(Debug, Default)]
struct IndexStore {
    chunks: Vec<Chunk>,
    /// Row-major, `chunks.len() * dimensions` values.
    vectors: Vec<f32>,
}

/// An in-memory vector index scored by cosine similarity.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use atlas_rag::{EmbeddingIndex, HashingEmbeddingProvider, ParagraphChunker};
///
/// let index = EmbeddingIndex::new(
///     Arc::new(HashingEmbeddingProvider::new(384)),
///     Arc::new(ParagraphChunker::default()),
/// );
/// index.add_document(&text, Some("https://example.com")).await?;
/// let evidence = index.retrieve("what is X?", 5).await?;
/// ```
pub struct EmbeddingIndex {
    provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    dimensions: usize,
    store: RwLock<IndexStore>,
}

impl EmbeddingIndex {
    /// Create an empty index. Dimensionality is taken from the provider and fixed for the
    /// lifetime of the index.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, chunker: Arc<dyn Chunker>) -> Self {
        let dimensions = provider.dimensions();
        Self { provider, chunker, dimensions, store: RwLock::new(IndexStore::default()) }
    }

    /// Vector dimensionality of this index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> usize {
        self.store.read().await.chunks.len()
    }

    /// Whether no chunk has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.chunks.is_empty()
    }

    fn zero_dimensions(&self) -> RagError {
        RagError::EmbeddingError {
            provider: self.provider.name().to_string(),
            message: "provider reports zero dimensions".into(),
        }
    }

    /// Check length and finiteness of a provider vector.
    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(RagError::EmbeddingError {
                provider: self.provider.name().to_string(),
                message: "embedding contains non-finite values".into(),
            });
        }
        Ok(())
    }

    /// A copy of the stored chunks in insertion order.
    pub async fn chunks(&self) -> Vec<Chunk> {
        self.store.read().await.chunks.clone()
    }

    /// Chunk `text`, embed every chunk in one batch call, and append chunks and vectors.
    ///
    /// Returns the number of chunks appended (zero when chunking yields nothing, in which case
    /// the embedding service is not called).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails, reports zero dimensions,
    /// returns the wrong number of vectors or a vector with NaN or infinite values, and
    /// [`RagError::DimensionMismatch`] for a vector of the wrong length. The index is left
    /// unchanged on error.
    pub async fn add_document(&self, text: &str, source_url: Option<&str>) -> Result<usize> {
        let chunks = self.chunker.chunk(text, source_url);
        if chunks.is_empty() {
            debug!(document.url = source_url, "document produced no chunks");
            return Ok(0);
        }
        if self.dimensions == 0 {
            return Err(self.zero_dimensions());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.url = source_url, error = %e, "embedding failed during indexing");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: self.provider.name().to_string(),
                message: format!(
                    "expected {} embeddings, received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let mut rows = Vec::with_capacity(chunks.len() * self.dimensions);
        for mut embedding in embeddings {
            self.check_vector(&embedding)?;
            l2_normalize(&mut embedding);
            rows.extend(embedding);
        }

        let chunk_count = chunks.len();
        let mut store = self.store.write().await;
        store.chunks.extend(chunks);
        store.vectors.extend(rows);
        info!(document.url = source_url, chunk_count, total = store.chunks.len(), "indexed document");

        Ok(chunk_count)
    }

    /// Return up to `k` chunks most similar to `query`, best first, ranked from 1.
    ///
    /// An empty index or `k == 0` returns an empty list without calling the embedding
    /// service. Equal scores keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] or [`RagError::DimensionMismatch`] if the query
    /// cannot be embedded or its vector is unusable.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Evidence>> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }
        if self.dimensions == 0 {
            return Err(self.zero_dimensions());
        }

        let mut query_vector = self.provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            e
        })?;
        self.check_vector(&query_vector)?;
        l2_normalize(&mut query_vector);

        let store = self.store.read().await;
        let mut scored: Vec<(usize, f32)> = store
            .vectors
            .chunks_exact(self.dimensions)
            .map(|row| row.iter().zip(&query_vector).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();

        // `sort_by` is stable, so ties keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let evidence: Vec<Evidence> = scored
            .into_iter()
            .enumerate()
            .map(|(position, (row, score))| {
                let chunk = &store.chunks[row];
                Evidence {
                    rank: position + 1,
                    score,
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    url: chunk.source_url.clone(),
                }
            })
            .collect();

        debug!(k, result_count = evidence.len(), "retrieval completed");
        Ok(evidence)
    }
}
