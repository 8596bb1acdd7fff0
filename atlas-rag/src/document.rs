//! Data types for indexed chunks and retrieved evidence.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use atlas_core::Evidence;

/// Number of hex digits kept from the SHA-256 digest for a chunk id.
const CHUNK_ID_HEX_LEN: usize = 16;

/// A retrievable unit of document text.
///
/// Chunks are created while a document is indexed and are never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Fingerprint of the source URL and a bounded prefix of the text.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Optional URL of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Chunk {
    /// Create a chunk, deriving its id from `source_url` and the first `id_prefix_chars`
    /// characters of `text`.
    pub fn new(text: impl Into<String>, source_url: Option<&str>, id_prefix_chars: usize) -> Self {
        let text = text.into();
        let id = chunk_id(source_url, &text, id_prefix_chars);
        Self { id, text, source_url: source_url.map(str::to_string) }
    }
}

/// Deterministic chunk identity: SHA-256 over the URL followed by the text prefix.
///
/// Only the prefix participates, so two chunks under the same URL that share their first
/// `prefix_chars` characters get the same id. Their index positions still differ.
pub fn chunk_id(source_url: Option<&str>, text: &str, prefix_chars: usize) -> String {
    let prefix_end = text.char_indices().nth(prefix_chars).map_or(text.len(), |(idx, _)| idx);

    let mut hasher = Sha256::new();
    hasher.update(source_url.unwrap_or_default().as_bytes());
    hasher.update(text[..prefix_end].as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..CHUNK_ID_HEX_LEN].to_string()
}
