//! Configuration loading and validation for Verbatim.
//!
//! Loads configuration from a TOML file with environment variable overrides
//! for secrets. Validates all settings at startup — the service must not
//! start with an invalid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `model.api_key`.
pub const API_KEY_ENV: &str = "VERBATIM_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Where the transcript comes from at startup.
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// Core engine knobs: budgets and bounds.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Model backend configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// HTTP gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Load from a TOML file, apply env overrides, then validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Pull secrets from the environment. Env always wins over the file so
    /// keys never need to live on disk.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.model.api_key = Some(key);
            }
        }
    }

    /// Validate bounds. Called at startup; failures are fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.token_budget == 0 {
            return Err(ConfigError::Invalid("engine.token_budget must be > 0".into()));
        }
        if self.engine.repair_attempts > 10 {
            return Err(ConfigError::Invalid(
                "engine.repair_attempts must be <= 10 (repair is a bounded loop)".into(),
            ));
        }
        if self.model.retry_attempts == 0 || self.model.retry_attempts > 10 {
            return Err(ConfigError::Invalid(
                "model.retry_attempts must be between 1 and 10".into(),
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid("model.timeout_secs must be > 0".into()));
        }
        if self.model.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(
                "model.max_output_tokens must be > 0".into(),
            ));
        }
        if self.transcript.source.is_empty() {
            return Err(ConfigError::Invalid("transcript.source must be set".into()));
        }
        Ok(())
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("transcript", &self.transcript)
            .field("engine", &self.engine)
            .field("model", &self.model)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Transcript ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// A local JSON file path or an `http(s)://` URL for the paginated
    /// ingestion endpoint.
    #[serde(default = "default_transcript_source")]
    pub source: String,

    /// Page size for HTTP ingestion.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Optional local file the HTTP loader mirrors the fetched transcript
    /// to, readable as a `source` on the next start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
}

fn default_transcript_source() -> String {
    "messages.json".into()
}
fn default_page_limit() -> usize {
    100
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            source: default_transcript_source(),
            page_limit: default_page_limit(),
            cache: None,
        }
    }
}

/// Engine budgets and bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Token budget for context assembly.
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Maximum repair re-prompts before the extractive fallback.
    #[serde(default = "default_repair_attempts")]
    pub repair_attempts: u32,
}

fn default_token_budget() -> usize {
    8192
}
fn default_repair_attempts() -> u32 {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            repair_attempts: default_repair_attempts(),
        }
    }
}

/// Model backend settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key (usually supplied via the `VERBATIM_API_KEY` env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name, e.g. "gemini-2.5-flash".
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generation API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens the model may produce per answer.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Maximum attempts per synthesis call (first try + retries).
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base backoff in milliseconds; doubles per attempt.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_output_tokens() -> u32 {
    256
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    500
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_backoff_ms(),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

/// Gateway listen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
