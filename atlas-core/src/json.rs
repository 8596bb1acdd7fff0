//! Lenient decoding of JSON embedded in model output.
//!
//! Models asked for "only JSON" still wrap it in prose or markdown fences. [`decode_lenient`]
//! tries, in order: the whole text, the first fenced code block, and the slice from the first
//! `{` to the last `}`. If none decodes, the caller receives [`UseDefault`] and substitutes its
//! own conservative value.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// No candidate in the text decoded into the requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no decodable JSON object found; use the default")]
pub struct UseDefault;

/// Decode `raw` into `T`, recovering JSON from fences or surrounding prose.
pub fn decode_lenient<T: DeserializeOwned>(raw: &str) -> Result<T, UseDefault> {
    candidates(raw)
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<T>(candidate).ok())
        .ok_or(UseDefault)
}

fn candidates(raw: &str) -> Vec<&str> {
    let mut out = vec![raw.trim()];
    if let Some(fenced) = fenced_block(raw) {
        out.push(fenced);
    }
    if let Some(sliced) = brace_slice(raw) {
        out.push(sliced);
    }
    out
}

/// Content of the first ```` ```json ```` or bare ```` ``` ```` block.
fn fenced_block(text: &str) -> Option<&str> {
    let start_markers = ["```json\n", "```json\r\n", "```\n", "```\r\n"];
    for marker in start_markers {
        if let Some(start_idx) = text.find(marker) {
            let content_start = start_idx + marker.len();
            if let Some(end_idx) = text[content_start..].find("```") {
                return Some(text[content_start..content_start + end_idx].trim());
            }
        }
    }
    None
}

/// From the first `{` to the last `}` inclusive.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
