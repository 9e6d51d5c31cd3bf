//! Context assembly — selecting which transcript messages enter the
//! model's working context.
//!
//! The common case for a small transcript is "everything fits": the whole
//! transcript goes in chronologically and no retrieval machinery runs.
//! Over budget, a deterministic relevance filter kicks in: messages are
//! ranked by lexical overlap with the question and taken greedily until the
//! budget is exhausted, ties broken by chronological order (earlier wins).
//! The selected subset is always re-emitted in chronological order so the
//! model can reason about temporal references.
//!
//! # Determinism
//!
//! Identical transcript + question + budget always yield the identical
//! selected subset and ordering. No random or time-dependent logic.

use crate::text;
use crate::token;
use tracing::debug;
use verbatim_core::{Context, Question, Transcript};

/// The context assembler. Stateless — create one and reuse it.
#[derive(Debug)]
pub struct ContextAssembler {
    token_budget: usize,
}

impl ContextAssembler {
    /// Create a new assembler with the given token budget.
    pub fn new(token_budget: usize) -> Self {
        Self { token_budget }
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Select and order a subset of the transcript for this question.
    pub fn assemble(&self, transcript: &Transcript, question: &Question) -> Context {
        let messages = transcript.messages();

        if messages.is_empty() {
            return Context::empty();
        }

        let full_tokens = token::estimate_messages_tokens(messages);
        if full_tokens <= self.token_budget {
            debug!(
                messages = messages.len(),
                tokens = full_tokens,
                "Full transcript fits the budget"
            );
            return Context {
                messages: messages.to_vec(),
                token_count: full_tokens,
            };
        }

        // Over budget: rank by lexical overlap with the question.
        let question_words = text::word_set(&question.text);

        let mut ranked: Vec<(usize, f64)> = messages
            .iter()
            .enumerate()
            .map(|(index, m)| (index, text::overlap_score(&question_words, &m.text)))
            .collect();

        // Highest score first; equal scores fall back to chronological
        // order, earlier message wins.
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let mut selected: Vec<usize> = Vec::new();
        let mut used = 0;

        for (index, _score) in ranked {
            let cost = token::estimate_message_tokens(&messages[index]);
            if used + cost <= self.token_budget {
                selected.push(index);
                used += cost;
            }
        }

        // Restore chronological order within the selection.
        selected.sort_unstable();

        debug!(
            selected = selected.len(),
            total = messages.len(),
            tokens = used,
            budget = self.token_budget,
            "Relevance filter applied"
        );

        Context {
            messages: selected.iter().map(|&i| messages[i].clone()).collect(),
            token_count: used,
        }
    }
}
