//! Snippet extraction for keyword hits.
//!
//! Terms are located with the same rules as [`tokenize`](super::tokenizer::tokenize),
//! so a highlighted word is exactly a word that matched in the index.

use super::tokenizer::is_edge_punct;
use std::collections::HashSet;
use std::ops::Range;

const ELLIPSIS: char = '…';

/// Builds a snippet around the first occurrence of any query term.
///
/// Keeps up to `context_chars` characters on each side of that match and wraps
/// every matching term inside the window in `**`. Returns `None` when no query
/// term occurs in `content`.
///
/// # Example
///
/// ```
/// use memoria_core::search::highlight::snippet;
///
/// let terms = vec!["milk".to_string()];
/// assert_eq!(snippet("Buy milk today", &terms, 60).as_deref(), Some("Buy **milk** today"));
/// ```
pub fn snippet(content: &str, query_terms: &[String], context_chars: usize) -> Option<String> {
    if query_terms.is_empty() {
        return None;
    }
    let wanted: HashSet<&str> = query_terms.iter().map(String::as_str).collect();

    let matches: Vec<Range<usize>> = term_spans(content)
        .filter(|span| wanted.contains(content[span.clone()].to_lowercase().as_str()))
        .collect();
    let first = matches.first()?;

    let start = chars_before(content, first.start, context_chars);
    let end = chars_after(content, first.end, context_chars);

    let mut out = String::with_capacity(end - start + matches.len() * 4 + 8);
    if start > 0 {
        out.push(ELLIPSIS);
    }

    let mut cursor = start;
    for span in matches.iter().filter(|s| s.start >= start && s.end <= end) {
        out.push_str(&content[cursor..span.start]);
        out.push_str("**");
        out.push_str(&content[span.clone()]);
        out.push_str("**");
        cursor = span.end;
    }
    out.push_str(&content[cursor..end]);

    if end < content.len() {
        out.push(ELLIPSIS);
    }
    Some(out)
}

/// Byte ranges of each term in `text`, with edge punctuation excluded.
fn term_spans(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut pieces = Vec::new();
    let mut piece_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), piece_start) {
            (true, Some(s)) => {
                pieces.push(s..i);
                piece_start = None;
            }
            (false, None) => piece_start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = piece_start {
        pieces.push(s..text.len());
    }

    pieces.into_iter().filter_map(move |piece| {
        let raw = &text[piece.clone()];
        let leading = raw.len() - raw.trim_start_matches(is_edge_punct).len();
        let core = raw.trim_matches(is_edge_punct);
        if core.is_empty() {
            return None;
        }
        let start = piece.start + leading;
        Some(start..start + core.len())
    })
}

/// Byte offset `n` characters before `idx`, clamped to 0.
fn chars_before(text: &str, idx: usize, n: usize) -> usize {
    if n == 0 {
        return idx;
    }
    text[..idx]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset `n` characters after `idx`, clamped to the end.
fn chars_after(text: &str, idx: usize, n: usize) -> usize {
    text[idx..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| idx + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tokenizer::tokenize;

    #[test]
    fn test_wraps_every_match() {
        let out = snippet("Buy milk, then more MILK.", &tokenize("milk"), 60).unwrap();
        assert_eq!(out, "Buy **milk**, then more **MILK**.");
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(snippet("walk the dog", &tokenize("milk"), 60).is_none());
        assert!(snippet("walk the dog", &[], 60).is_none());
    }

    #[test]
    fn test_window_is_trimmed_with_ellipsis() {
        let content = format!("{} needle {}", "a".repeat(100), "b".repeat(100));
        let out = snippet(&content, &tokenize("needle"), 10).unwrap();

        assert!(out.starts_with(ELLIPSIS));
        assert!(out.ends_with(ELLIPSIS));
        assert!(out.contains("**needle**"));
        assert_eq!(out.chars().count(), 10 + "**needle**".len() + 10 + 2);
    }

    #[test]
    fn test_matches_whole_terms_only() {
        let out = snippet("milkshake and milk", &tokenize("milk"), 60).unwrap();
        assert_eq!(out, "milkshake and **milk**");
    }

    #[test]
    fn test_multibyte_content() {
        let out = snippet("café über straße", &tokenize("über"), 3).unwrap();
        assert_eq!(out, "…fé **über** st…");
    }
}
