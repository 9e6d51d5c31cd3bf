//! # Verbatim Core
//!
//! Domain types, traits, and error definitions for the Verbatim transcript
//! Q&A service. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The model backend is defined as a trait here; implementations live in
//! `verbatim-providers`. This enables:
//! - Swapping backends via configuration
//! - Deterministic testing with scripted stub providers
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, LoadError, ModelError, QueryError, Result};
pub use message::{Answer, AnswerStatus, Context, MessageId, Question, Transcript, TranscriptMessage};
pub use provider::{GenerateRequest, GenerateResponse, ModelProvider};
