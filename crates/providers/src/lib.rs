//! Model backend implementations for Verbatim.
//!
//! All backends implement the `verbatim_core::ModelProvider` trait.

pub mod gemini;

pub use gemini::GeminiProvider;

use std::sync::Arc;
use verbatim_config::ModelConfig;
use verbatim_core::{Error, ModelProvider};

/// Build the configured model provider.
///
/// Fails fast when no API key is available — the service must not start
/// half-configured.
pub fn build_from_config(config: &ModelConfig) -> Result<Arc<dyn ModelProvider>, Error> {
    let api_key = config.api_key.clone().ok_or_else(|| Error::Config {
        message: format!(
            "No model API key configured — set model.api_key or the {} env var",
            verbatim_config::API_KEY_ENV
        ),
    })?;

    Ok(Arc::new(GeminiProvider::new(
        &config.api_base_url,
        &config.model,
        api_key,
    )))
}
