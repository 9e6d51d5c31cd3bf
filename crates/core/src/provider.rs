//! ModelProvider trait — the abstraction over the generative model backend.
//!
//! A provider knows how to send one rendered prompt to a model and get text
//! back. Latency and rate-limit behavior are opaque to the core; callers
//! enforce their own timeout around `generate`.

use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single generation request: one rendered prompt plus an output-length hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The fully rendered prompt (instructions + context + question).
    pub prompt: String,

    /// Maximum tokens the model may produce.
    pub max_output_tokens: u32,
}

/// The raw model output for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated text, untrimmed.
    pub text: String,

    /// Which model actually responded (may differ from requested).
    pub model: String,
}

/// The model capability collaborator.
///
/// The engine calls `generate()` without knowing which backend is in use —
/// pure polymorphism. Implementations must be cheap to share behind `Arc`.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send one prompt and get generated text back.
    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, ModelError>;

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, ModelError> {
        Ok(true)
    }
}

impl std::fmt::Debug for dyn ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProvider")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization_roundtrip() {
        let req = GenerateRequest {
            prompt: "Question: who?".into(),
            max_output_tokens: 256,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: GenerateRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.prompt, req.prompt);
        assert_eq!(back.max_output_tokens, 256);
    }

    struct EchoProvider;

    #[async_trait]
    impl ModelProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            request: GenerateRequest,
        ) -> std::result::Result<GenerateResponse, ModelError> {
            Ok(GenerateResponse {
                text: request.prompt,
                model: "echo-1".into(),
            })
        }
    }

    #[tokio::test]
    async fn provider_trait_is_object_safe() {
        let provider: std::sync::Arc<dyn ModelProvider> = std::sync::Arc::new(EchoProvider);
        let resp = provider
            .generate(GenerateRequest {
                prompt: "hi".into(),
                max_output_tokens: 8,
            })
            .await
            .unwrap();
        assert_eq!(resp.text, "hi");
        assert!(provider.health_check().await.unwrap());
    }
}
