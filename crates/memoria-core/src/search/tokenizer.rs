//! Term extraction shared by indexing and querying.
//!
//! Text is split on Unicode whitespace (newlines included), leading and
//! trailing punctuation is stripped from each piece, and the remainder is
//! lowercased. Interior punctuation is kept, so `"e-mail"` and `"v1.2"` stay
//! single terms.

/// Splits `text` into lowercase terms.
///
/// Returns an empty vector for empty or whitespace-only input.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|piece| piece.trim_matches(is_edge_punct))
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Characters stripped from both ends of each whitespace-separated piece.
pub(crate) fn is_edge_punct(c: char) -> bool {
    c.is_ascii_punctuation() || is_unicode_punct(c)
}

/// Punctuation outside ASCII that commonly wraps words in captured text.
fn is_unicode_punct(c: char) -> bool {
    matches!(
        c,
        '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2026}' | '\u{2013}' | '\u{2014}'
            | '\u{00AB}' | '\u{00BB}' | '\u{00BF}' | '\u{00A1}'
    )
}
