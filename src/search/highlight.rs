//! Highlight fragment extraction.
//!
//! Wraps matched query terms in the stored field text with the configured
//! marker pair. Matching is token-exact and case-insensitive against the
//! analyzed query terms; a hit found only through a fuzzy edit returns no
//! markup for that field.

use crate::search::query::HighlightSpec;

/// Byte spans of alphanumeric token runs in `text`.
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if start.is_none() {
                start = Some(idx);
            }
        } else if let Some(s) = start.take() {
            spans.push((s, idx));
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    spans
}

/// Mark up every token of `text` that matches one of `terms`
/// (lowercased). Returns `None` when nothing matched.
pub fn highlight_field(text: &str, terms: &[String], spec: &HighlightSpec) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut matched = false;

    for (start, end) in token_spans(text) {
        let token = text[start..end].to_lowercase();
        if terms.iter().any(|t| *t == token) {
            out.push_str(&text[last..start]);
            out.push_str(&spec.pre_tag);
            out.push_str(&text[start..end]);
            out.push_str(&spec.post_tag);
            last = end;
            matched = true;
        }
    }

    if matched {
        out.push_str(&text[last..]);
        Some(out)
    } else {
        None
    }
}
