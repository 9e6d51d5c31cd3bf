//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text, which is plenty for budget enforcement on a chat transcript.

use verbatim_core::TranscriptMessage;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Per-line overhead for the rendered `author, timestamp, text` form:
/// separators plus the newline.
const LINE_OVERHEAD: usize = 2;

/// Estimate tokens for one message as it will appear in the prompt.
pub fn estimate_message_tokens(message: &TranscriptMessage) -> usize {
    LINE_OVERHEAD
        + estimate_tokens(&message.author)
        + estimate_tokens(&message.timestamp.to_rfc3339())
        + estimate_tokens(&message.text)
}

/// Estimate tokens for a slice of messages.
pub fn estimate_messages_tokens(messages: &[TranscriptMessage]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}
