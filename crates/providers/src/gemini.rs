//! Gemini `generateContent` provider implementation.
//!
//! Sends one rendered prompt per request and returns the first candidate's
//! text. Status codes are classified into the transient/fatal taxonomy the
//! synthesizer's retry policy relies on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use verbatim_core::error::ModelError;
use verbatim_core::provider::{GenerateRequest, GenerateResponse, ModelProvider};

/// A Gemini-style generation backend.
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, ModelError> {
        let body = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart { text: request.prompt }],
            }],
            generation_config: ApiGenerationConfig {
                max_output_tokens: request.max_output_tokens,
            },
        };

        debug!(provider = %self.name(), model = %self.model, "Sending generation request");

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(e.to_string())
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ModelError::RateLimited { retry_after_secs: 5 });
        }

        if status == 401 || status == 403 {
            return Err(ModelError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 400 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ModelError::InvalidRequest(error_body));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model backend returned error");
            return Err(ModelError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ModelError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let text = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ModelError::ApiError {
                status_code: 200,
                message: "No candidates in response".into(),
            })?;

        Ok(GenerateResponse {
            text,
            model: self.model.clone(),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ModelError> {
        // generateContent has no cheap ping; reaching the host at all is
        // enough of a signal.
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;
        Ok(response.status().as_u16() < 500)
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct ApiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: ApiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_model_and_key() {
        let provider = GeminiProvider::new(
            "https://generativelanguage.googleapis.com/v1beta/models/",
            "gemini-2.5-flash",
            "test-key",
        );
        let url = provider.endpoint();
        assert!(url.contains("models/gemini-2.5-flash:generateContent"));
        assert!(url.ends_with("key=test-key"));
    }

    #[test]
    fn request_body_shape() {
        let body = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: "Question: how many cars?".into(),
                }],
            }],
            generation_config: ApiGenerationConfig {
                max_output_tokens: 256,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "Question: how many cars?"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn parse_candidate_response() {
        let data = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Vikram has 3 cars."}]}}
            ]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(
            parsed.candidates[0].content.parts[0].text,
            "Vikram has 3 cars."
        );
    }

    #[test]
    fn parse_empty_candidates() {
        let parsed: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
