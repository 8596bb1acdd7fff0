//! # atlas-rag
//!
//! Per-run evidence index and retriever for the ATLAS research pipeline.
//!
//! ## Overview
//!
//! Cleaned web documents are split into paragraph chunks, embedded, and appended to an
//! [`EmbeddingIndex`]. Sub-questions are then answered from the top-k chunks by cosine
//! similarity through an [`EvidenceRetriever`].
//!
//! - [`ParagraphChunker`] - blank-line chunking with a minimum paragraph length
//! - [`EmbeddingProvider`] - async embedding seam
//! - [`HashingEmbeddingProvider`] - offline deterministic embeddings
//! - `OpenAIEmbeddingProvider` - OpenAI-compatible endpoints (feature `openai`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use atlas_rag::{EmbeddingIndex, EvidenceRetriever, HashingEmbeddingProvider, ParagraphChunker};
//!
//! let index = Arc::new(EmbeddingIndex::new(
//!     Arc::new(HashingEmbeddingProvider::new(384)),
//!     Arc::new(ParagraphChunker::default()),
//! ));
//! index.add_document(&cleaned_text, Some(url)).await?;
//!
//! let retriever = EvidenceRetriever::new(index, 5);
//! let evidence = retriever.retrieve_evidence("How do tides form?").await?;
//! ```

pub mod chunking;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod index;
pub mod retriever;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, ParagraphChunker};
pub use document::{Chunk, Evidence, chunk_id};
pub use embedding::{EmbeddingProvider, l2_normalize};
pub use error::{RagError, Result};
pub use hashing::HashingEmbeddingProvider;
pub use index::EmbeddingIndex;
pub use retriever::EvidenceRetriever;

#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
