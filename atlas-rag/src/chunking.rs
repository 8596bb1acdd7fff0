//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`ParagraphChunker`], which splits extracted
//! web text on blank lines and keeps only paragraphs long enough to carry real content.

use atlas_core::RagConfig;

use crate::document::Chunk;

/// A strategy for splitting document text into chunks.
///
/// Implementations are pure: they neither read nor mutate any index state.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks tagged with `source_url`.
    ///
    /// Returns an empty `Vec` only if `text` is empty or whitespace.
    fn chunk(&self, text: &str, source_url: Option<&str>) -> Vec<Chunk>;
}

/// Splits text into paragraphs on blank-line boundaries.
///
/// Paragraphs shorter than `min_chunk_chars` characters (menus, captions, bylines) are
/// dropped. If that drops everything, the whole trimmed text becomes a single chunk so a
/// document made only of short paragraphs still reaches the index.
///
/// # Example
///
/// ```rust,ignore
/// use atlas_rag::ParagraphChunker;
///
/// let chunker = ParagraphChunker::new(200, 200);
/// let chunks = chunker.chunk(&text, Some("https://example.com/post"));
/// ```
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    min_chunk_chars: usize,
    id_prefix_chars: usize,
}

impl ParagraphChunker {
    /// Create a new `ParagraphChunker`.
    ///
    /// # Arguments
    ///
    /// * `min_chunk_chars` - minimum paragraph length in characters
    /// * `id_prefix_chars` - how many leading characters feed each chunk id
    pub fn new(min_chunk_chars: usize, id_prefix_chars: usize) -> Self {
        Self { min_chunk_chars, id_prefix_chars }
    }

    /// Create a chunker from the chunking section of the configuration.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.min_chunk_chars, config.id_prefix_chars)
    }
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

/// Split on lines that are empty or whitespace-only; each paragraph is trimmed.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }

    paragraphs
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, text: &str, source_url: Option<&str>) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = split_paragraphs(text)
            .into_iter()
            .filter(|p| p.chars().count() >= self.min_chunk_chars)
            .map(|p| Chunk::new(p, source_url, self.id_prefix_chars))
            .collect();

        let trimmed = text.trim();
        if chunks.is_empty() && !trimmed.is_empty() {
            chunks.push(Chunk::new(trimmed, source_url, self.id_prefix_chars));
        }

        chunks
    }
}
