//! Prompt assembly helpers shared by the agents.

use atlas_core::Evidence;

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cut `text` to at most `max_chars` characters, ending with a `[truncated <note>]` marker.
///
/// The marker counts toward the limit. Text already within the limit is returned unchanged.
pub fn truncate_with_note(text: &str, max_chars: usize, note: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker = if note.is_empty() {
        "\n...[truncated]...".to_string()
    } else {
        format!("\n...[truncated {note}]...")
    };
    let keep = max_chars.saturating_sub(marker.chars().count());
    format!("{}{marker}", truncate_chars(text, keep))
}

/// `[i] (source: url)` blocks for the answerer, each chunk cut to `max_chunk_chars`.
pub fn answer_evidence_block(evidence: &[Evidence], max_chunk_chars: usize) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let url = e.url.as_deref().unwrap_or("unknown source");
            format!("[{}] (source: {url})\n{}", i + 1, truncate_chars(&e.text, max_chunk_chars))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Numbered evidence for the critic, capped at `max_total_chars` overall.
///
/// The entry that crosses the cap is cut and followed by a truncation marker; later entries
/// are dropped.
pub fn critic_evidence_block(evidence: &[Evidence], max_total_chars: usize) -> String {
    let mut parts = Vec::new();
    let mut total = 0usize;

    for (i, e) in evidence.iter().enumerate() {
        let url = e.url.as_deref().unwrap_or("N/A");
        let entry = format!("[{}] Source: {url}\n{}\n", i + 1, e.text.trim());
        let entry_len = entry.chars().count();

        if total + entry_len > max_total_chars {
            let remaining = max_total_chars.saturating_sub(total);
            parts.push(format!("{}\n...[evidence truncated]...", truncate_chars(&entry, remaining)));
            break;
        }
        parts.push(entry);
        total += entry_len;
    }

    parts.join("\n\n")
}
