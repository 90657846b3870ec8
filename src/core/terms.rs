//! Query term normalization.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Terms must be strictly longer than this to be significant.
pub const MIN_TERM_LENGTH: usize = 2;

/// Common English words plus domain words that appear on nearly every node.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "onto", "that", "this", "these", "those", "are",
    "was", "were", "been", "being", "has", "have", "had", "not", "but", "its", "our", "your",
    "their", "you", "all", "any", "can", "will", "use", "using", "via", "per", "out", "off",
    "over", "under", "than", "then", "them", "they", "what", "which", "who", "how", "why", "when",
    "where", "also", "just", "only", "some", "such", "very", "more", "most", "other", "each",
    // Domain
    "node", "layer", "neural", "network", "ml", "ai", "model", "deep",
];

static STOP_WORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

pub fn is_stop_word(term: &str) -> bool {
    STOP_WORD_SET.contains(term)
}

/// Split a raw query into significant, lowercased search terms.
pub fn split_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| t.chars().count() > MIN_TERM_LENGTH)
        .filter(|t| !is_stop_word(t))
        .collect()
}
