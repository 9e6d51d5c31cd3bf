//! Error types for the Verbatim domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Verbatim operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transcript loading ---
    #[error("Transcript load error: {0}")]
    Load(#[from] LoadError),

    // --- Model backend ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Query processing ---
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Malformed or duplicate transcript data. Fatal at startup: the service
/// must not start with a broken transcript.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Message at index {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Duplicate message id: {0}")]
    DuplicateId(String),

    #[error("Transcript source unreadable: {0}")]
    SourceUnavailable(String),

    #[error("Transcript source returned malformed data: {0}")]
    Malformed(String),
}

/// Failures from the external model capability.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by model backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed request rejected by model backend: {0}")]
    InvalidRequest(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ModelError {
    /// Whether this failure is worth retrying with backoff.
    ///
    /// Rate limits, network failures, timeouts, and 5xx-class upstream
    /// errors are transient. Credential and request-shape failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::InvalidRequest(_) => false,
        }
    }
}

/// Service-level query failures, distinct from a valid "not found" answer.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Retries exhausted (or a fatal upstream failure) while calling the
    /// model. Never presented to the end user as a content answer.
    #[error("Answer synthesis failed: {0}")]
    SynthesisFailed(#[source] ModelError),

    #[error("Question must not be empty")]
    EmptyQuestion,
}
