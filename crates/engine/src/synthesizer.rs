//! Answer synthesis — the single outbound call to the model capability,
//! wrapped in a timeout and a bounded retry policy.
//!
//! Transient failures (rate limits, network errors, timeouts, 5xx) are
//! retried with exponential backoff. Fatal failures (bad credentials,
//! malformed requests) surface immediately. Exhaustion escalates to
//! `QueryError::SynthesisFailed` — never silently swallowed.

use crate::prompt::Prompt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use verbatim_core::error::{ModelError, QueryError};
use verbatim_core::provider::{GenerateRequest, ModelProvider};

/// Drives model calls for the query service.
#[derive(Debug)]
pub struct AnswerSynthesizer {
    provider: Arc<dyn ModelProvider>,
    request_timeout: Duration,
    max_output_tokens: u32,
    max_attempts: u32,
    base_backoff: Duration,
}

impl AnswerSynthesizer {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            request_timeout: Duration::from_secs(60),
            max_output_tokens: 256,
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }

    /// Set the per-attempt request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the output-length hint passed to the model.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    /// Set the retry policy: total attempts and the base backoff, which
    /// doubles per attempt.
    pub fn with_retry(mut self, max_attempts: u32, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    /// Send one prompt to the model, retrying transient failures.
    pub async fn synthesize(&self, prompt: &Prompt) -> Result<String, QueryError> {
        let mut last_error = ModelError::Network("no attempt made".into());

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let backoff = self.base_backoff * 2u32.pow(attempt - 1);
                debug!(attempt, backoff_ms = backoff.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(backoff).await;
            }

            let request = GenerateRequest {
                prompt: prompt.text.clone(),
                max_output_tokens: self.max_output_tokens,
            };

            let outcome = timeout(self.request_timeout, self.provider.generate(request)).await;

            match outcome {
                Ok(Ok(response)) => {
                    debug!(
                        provider = %self.provider.name(),
                        model = %response.model,
                        attempt = attempt + 1,
                        "Model responded"
                    );
                    return Ok(response.text);
                }
                Ok(Err(e)) if e.is_transient() => {
                    warn!(
                        provider = %self.provider.name(),
                        error = %e,
                        attempt = attempt + 1,
                        max = self.max_attempts,
                        "Transient model failure"
                    );
                    last_error = e;
                }
                Ok(Err(e)) => {
                    warn!(provider = %self.provider.name(), error = %e, "Fatal model failure");
                    return Err(QueryError::SynthesisFailed(e));
                }
                Err(_) => {
                    warn!(
                        provider = %self.provider.name(),
                        timeout_secs = self.request_timeout.as_secs(),
                        attempt = attempt + 1,
                        "Model call timed out"
                    );
                    last_error = ModelError::Timeout(format!(
                        "no response within {}s",
                        self.request_timeout.as_secs()
                    ));
                }
            }
        }

        Err(QueryError::SynthesisFailed(last_error))
    }
}
