//! CLI command implementations.

pub mod ask;
pub mod serve;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use verbatim_config::AppConfig;
use verbatim_engine::{AnswerSynthesizer, ContextAssembler, QueryService};
use verbatim_transcript::{HttpLoader, JsonFileLoader, TranscriptLoader, TranscriptStore};

/// Load the transcript, build the provider, and wire the query service.
/// Shared by `serve` and `ask`.
pub async fn bootstrap(
    config: &AppConfig,
) -> Result<(QueryService, usize), Box<dyn std::error::Error>> {
    let source = &config.transcript.source;
    let loader: Box<dyn TranscriptLoader> =
        if source.starts_with("http://") || source.starts_with("https://") {
            let mut http = HttpLoader::new(source, config.transcript.page_limit);
            if let Some(cache) = &config.transcript.cache {
                http = http.with_cache(cache);
            }
            Box::new(http)
        } else {
            Box::new(JsonFileLoader::new(source))
        };

    let transcript = loader.load().await?;
    let store = Arc::new(TranscriptStore::new(transcript));
    let messages_loaded = store.len();
    info!(messages = messages_loaded, "Transcript store ready");

    let provider = verbatim_providers::build_from_config(&config.model)?;

    let synthesizer = AnswerSynthesizer::new(provider)
        .with_timeout(Duration::from_secs(config.model.timeout_secs))
        .with_max_output_tokens(config.model.max_output_tokens)
        .with_retry(
            config.model.retry_attempts,
            Duration::from_millis(config.model.retry_backoff_ms),
        );

    let service = QueryService::new(
        store,
        ContextAssembler::new(config.engine.token_budget),
        synthesizer,
    )
    .with_repair_attempts(config.engine.repair_attempts);

    Ok((service, messages_loaded))
}
