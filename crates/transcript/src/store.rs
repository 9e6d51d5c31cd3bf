//! The read-only message store.

use verbatim_core::Transcript;

/// Holds the immutable transcript.
///
/// Loaded once at startup, shared via `Arc`, never mutated. Concurrent
/// readers require no locking.
#[derive(Debug)]
pub struct TranscriptStore {
    transcript: Transcript,
}

impl TranscriptStore {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }

    /// The full immutable message sequence.
    pub fn all(&self) -> &Transcript {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}
