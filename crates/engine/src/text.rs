//! Text normalization, lexical overlap scoring, and sentence-boundary
//! detection.
//!
//! Everything here is deterministic and pure — the verbatim contract and
//! the relevance filter both reduce to set operations over normalized
//! words.

use std::collections::HashSet;

/// Function words exempt from the verbatim containment check. The model is
/// allowed glue words; facts, names, and numbers must come from the context.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "did", "do", "does", "for", "from",
    "had", "has", "have", "he", "her", "his", "i", "in", "is", "it", "its", "my", "no", "not",
    "of", "on", "or", "our", "s", "she", "so", "t", "that", "the", "their", "them", "they",
    "this", "to", "was", "we", "were", "what", "when", "where", "which", "who", "will", "with",
    "you", "your",
];

/// Lowercase and split on anything non-alphanumeric.
pub fn normalize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// The normalized word set of a text.
pub fn word_set(text: &str) -> HashSet<String> {
    normalize_words(text).into_iter().collect()
}

/// Normalized words with function words removed.
pub fn content_words(text: &str) -> Vec<String> {
    normalize_words(text)
        .into_iter()
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Lexical overlap between a question's word set and a message text:
/// the fraction of question words the message contains. Case-insensitive,
/// punctuation-insensitive, in [0.0, 1.0].
pub fn overlap_score(question_words: &HashSet<String>, message_text: &str) -> f64 {
    if question_words.is_empty() {
        return 0.0;
    }
    let message_words = word_set(message_text);
    let shared = question_words.intersection(&message_words).count();
    shared as f64 / question_words.len() as f64
}

/// Count sentence boundaries in a text.
///
/// A terminal mark (`.`, `!`, `?`) is a boundary when it ends the text or
/// is followed by whitespace and then an uppercase letter or digit.
/// Decimals like "3.5" do not count: the mark is followed directly by a
/// digit, not whitespace.
pub fn sentence_boundaries(text: &str) -> usize {
    let trimmed = text.trim_end();
    let chars: Vec<char> = trimmed.chars().collect();
    let mut count = 0;

    let mut i = 0;
    while i < chars.len() {
        if matches!(chars[i], '.' | '!' | '?') {
            // Swallow runs like "?!" or "..." as one boundary.
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j], '.' | '!' | '?') {
                j += 1;
            }

            if j >= chars.len() {
                count += 1;
            } else if chars[j].is_whitespace() {
                let next = chars[j..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(c) if c.is_uppercase() || c.is_ascii_digit()) {
                    count += 1;
                }
            }
            i = j;
        } else {
            i += 1;
        }
    }

    count
}

/// Whether a text is exactly one terminal sentence: non-blank, ends with a
/// closing mark, and contains no embedded sentence boundary.
pub fn is_single_sentence(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if !trimmed.ends_with(['.', '!', '?']) {
        return false;
    }
    sentence_boundaries(trimmed) == 1
}

/// The first sentence of a text, boundary mark included. Falls back to the
/// whole (trimmed) text when no boundary exists.
pub fn first_sentence(text: &str) -> &str {
    let trimmed = text.trim();
    let chars: Vec<(usize, char)> = trimmed.char_indices().collect();

    for (pos, (byte_idx, c)) in chars.iter().enumerate() {
        if matches!(c, '.' | '!' | '?') {
            let rest = &trimmed[byte_idx + c.len_utf8()..];
            let next = rest.trim_start().chars().next();
            let followed_by_space = chars
                .get(pos + 1)
                .map(|(_, nc)| nc.is_whitespace())
                .unwrap_or(true);

            if followed_by_space
                && (next.is_none() || matches!(next, Some(n) if n.is_uppercase() || n.is_ascii_digit()))
            {
                return &trimmed[..byte_idx + c.len_utf8()];
            }
        }
    }

    trimmed
}
