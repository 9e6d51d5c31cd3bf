//! Answer validation against the verbatim / one-sentence contract.
//!
//! Checks run in order: non-blank, exactly one terminal sentence, then
//! verbatim containment — every content word of the response must appear in
//! the union of words across the context messages. The sentinel "not found"
//! phrase is always accepted as-is. A failed check produces a `Violation`
//! that drives one bounded repair re-prompt; when repairs are exhausted the
//! deterministic extractive fallback takes over.

use crate::prompt::SENTINEL;
use crate::text;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;
use verbatim_core::{Answer, Context, MessageId, Question};

/// A specific way a model response broke the contract. Internal — drives
/// the repair loop, never escalates past it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("the reply was blank")]
    Blank,

    #[error("the reply was not exactly one terminal sentence ({boundaries} sentence boundaries found)")]
    NotOneSentence { boundaries: usize },

    #[error("the reply used words absent from the messages: {}", words.join(", "))]
    ForeignWords { words: Vec<String> },
}

/// Outcome of validating one raw model response.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// The response honors the contract.
    Accepted(Answer),
    /// The response must be re-prompted with this violation.
    Repair(Violation),
}

/// Validates raw responses and produces the extractive fallback.
#[derive(Debug)]
pub struct AnswerValidator {
    /// Minimum question overlap a message needs before the fallback will
    /// quote it. Below this, the answer is NotFound.
    min_overlap: f64,
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self { min_overlap: f64::EPSILON }
    }
}

impl AnswerValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a higher overlap score before the fallback quotes a message.
    pub fn with_min_overlap(mut self, min_overlap: f64) -> Self {
        self.min_overlap = min_overlap;
        self
    }

    /// Check a raw model response against the contract.
    pub fn validate(&self, raw: &str, context: &Context) -> Verdict {
        // Unwrap only a full matching quote pair; a reply that merely
        // opens with a quoted phrase keeps its quotes.
        let trimmed = raw.trim();
        let trimmed = match trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
        {
            Some(inner) => inner.trim(),
            None => trimmed,
        };

        // The sentinel phrase is always accepted as-is.
        if trimmed == SENTINEL {
            return Verdict::Accepted(Answer::not_found(SENTINEL));
        }

        if trimmed.is_empty() {
            return Verdict::Repair(Violation::Blank);
        }

        if !text::is_single_sentence(trimmed) {
            return Verdict::Repair(Violation::NotOneSentence {
                boundaries: text::sentence_boundaries(trimmed),
            });
        }

        let context_union = context_word_union(context);
        let answer_words = text::content_words(trimmed);
        let foreign: Vec<String> = answer_words
            .iter()
            .filter(|w| !context_union.contains(*w))
            .cloned()
            .collect();

        if !foreign.is_empty() {
            return Verdict::Repair(Violation::ForeignWords { words: foreign });
        }

        let provenance = provenance_cover(&answer_words, context);
        Verdict::Accepted(Answer::found(trimmed, provenance))
    }

    /// The deterministic extractive fallback after repair exhaustion:
    /// quote the single context message with the highest lexical overlap
    /// against the question, rendered as one sentence.
    ///
    /// Equally relevant messages conflict-break toward the most recent one.
    /// Below the minimum overlap threshold the answer is NotFound.
    pub fn fallback(&self, context: &Context, question: &Question) -> Answer {
        let question_words = text::word_set(&question.text);

        let mut best: Option<(usize, f64)> = None;
        for (index, message) in context.messages.iter().enumerate() {
            let score = text::overlap_score(&question_words, &message.text);
            // >= so the most recent of equally relevant messages wins.
            let improves = match best {
                Some((_, best_score)) => score >= best_score,
                None => true,
            };
            if improves && score >= self.min_overlap {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) => {
                let message = &context.messages[index];
                debug!(
                    id = %message.id,
                    score,
                    "Extractive fallback selected a message"
                );
                Answer::found(
                    render_one_sentence(&message.text),
                    vec![message.id.clone()],
                )
            }
            None => Answer::not_found(SENTINEL),
        }
    }
}

/// Union of normalized words across all context messages.
fn context_word_union(context: &Context) -> HashSet<String> {
    let mut union = HashSet::new();
    for message in &context.messages {
        union.extend(text::normalize_words(&message.text));
        // Author names are part of the supplied context too.
        union.extend(text::normalize_words(&message.author));
    }
    union
}

/// Greedy cover: rank messages by how many still-uncovered answer words
/// they contain, take until every answer word is covered, then emit ids in
/// chronological order. Validation guarantees the full union covers the
/// words, so this terminates with a complete cover.
fn provenance_cover(answer_words: &[String], context: &Context) -> Vec<MessageId> {
    let mut remaining: HashSet<&str> = answer_words.iter().map(String::as_str).collect();
    if remaining.is_empty() {
        return Vec::new();
    }

    let message_words: Vec<HashSet<String>> = context
        .messages
        .iter()
        .map(|m| {
            let mut words = text::word_set(&m.text);
            words.extend(text::normalize_words(&m.author));
            words
        })
        .collect();

    let mut chosen: Vec<usize> = Vec::new();

    while !remaining.is_empty() {
        let mut best: Option<(usize, usize)> = None;
        for (index, words) in message_words.iter().enumerate() {
            if chosen.contains(&index) {
                continue;
            }
            let covered = remaining.iter().filter(|w| words.contains(**w)).count();
            // Strict > keeps the earlier message on ties.
            if covered > 0 && best.map(|(_, c)| covered > c).unwrap_or(true) {
                best = Some((index, covered));
            }
        }

        match best {
            Some((index, _)) => {
                remaining.retain(|w| !message_words[index].contains(*w));
                chosen.push(index);
            }
            // No message covers the leftovers; validation upstream makes
            // this unreachable for accepted answers.
            None => break,
        }
    }

    chosen.sort_unstable();
    chosen
        .into_iter()
        .map(|i| context.messages[i].id.clone())
        .collect()
}

/// Render a message text as a single terminal sentence: first sentence
/// only, closing mark enforced.
fn render_one_sentence(message_text: &str) -> String {
    let mut sentence = text::first_sentence(message_text).to_string();
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    sentence
}
