//! # Verbatim Engine
//!
//! The context-assembly and constrained-answer-synthesis core:
//!
//! - [`assembler::ContextAssembler`] selects transcript messages under a
//!   token budget, deterministically.
//! - [`prompt::PromptBuilder`] renders the selected context plus the
//!   question into the instruction that forces verbatim, single-sentence,
//!   context-only answers.
//! - [`synthesizer::AnswerSynthesizer`] drives the outbound model call with
//!   timeout, bounded retries, and exponential backoff.
//! - [`validator::AnswerValidator`] enforces the verbatim/one-sentence
//!   contract, requests bounded repairs, and falls back to a deterministic
//!   extractive answer.
//! - [`service::QueryService`] orchestrates one question end to end.

pub mod assembler;
pub mod prompt;
pub mod service;
pub mod synthesizer;
pub mod text;
pub mod token;
pub mod validator;

pub use assembler::ContextAssembler;
pub use prompt::{Prompt, PromptBuilder, SENTINEL};
pub use service::QueryService;
pub use synthesizer::AnswerSynthesizer;
pub use validator::{AnswerValidator, Verdict, Violation};
