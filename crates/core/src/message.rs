//! Transcript and answer domain types.
//!
//! These are the value objects that flow through the system:
//! a Transcript is loaded once at startup → each Question selects a Context
//! → the model produces a candidate → validation yields an Answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a transcript message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single message in the chat transcript.
///
/// Created once at load time, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    /// Unique message ID within the transcript.
    pub id: MessageId,

    /// Who wrote this message.
    pub author: String,

    /// When it was written. Timestamps define the total order used for
    /// tie-breaking.
    pub timestamp: DateTime<Utc>,

    /// The text content.
    pub text: String,
}

/// The full ordered set of chat messages available to the system.
///
/// Insertion order equals chronological order; the loader enforces this with
/// a stable sort. Immutable for the lifetime of the running service —
/// replacing it requires a full reload, never incremental mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
}

impl Transcript {
    /// Build a transcript from messages already in chronological order.
    pub fn new(messages: Vec<TranscriptMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A natural-language question. Transient, one per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// The ordered subset of transcript messages selected for one question,
/// plus the cumulative token count consumed.
///
/// Recomputed per request; never cached across questions because relevance
/// depends on the question.
#[derive(Debug, Clone)]
pub struct Context {
    /// Selected messages, always in chronological order.
    pub messages: Vec<TranscriptMessage>,

    /// Estimated tokens consumed by the rendered context.
    pub token_count: usize,
}

impl Context {
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            token_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Terminal outcome of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// A context message answered the question.
    Found,
    /// No context message addressed the question. Not an error.
    NotFound,
}

/// The final answer for a question. Constructed fresh per request; never
/// mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Exactly one sentence, composed only of words from the context
    /// (or the fixed sentinel phrase for `NotFound`).
    pub text: String,

    /// Ordered ids of the messages actually relied upon.
    pub provenance: Vec<MessageId>,

    pub status: AnswerStatus,
}

impl Answer {
    /// A found answer backed by the given messages.
    pub fn found(text: impl Into<String>, provenance: Vec<MessageId>) -> Self {
        Self {
            text: text.into(),
            provenance,
            status: AnswerStatus::Found,
        }
    }

    /// The not-found answer carrying the sentinel phrase.
    pub fn not_found(sentinel: impl Into<String>) -> Self {
        Self {
            text: sentinel.into(),
            provenance: Vec::new(),
            status: AnswerStatus::NotFound,
        }
    }
}
