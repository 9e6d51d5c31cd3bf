//! `verbatim serve` — Start the HTTP API server.

use std::sync::Arc;
use verbatim_config::AppConfig;
use verbatim_gateway::GatewayState;

pub async fn run(config_path: &str, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let (service, messages_loaded) = super::bootstrap(&config).await?;

    println!("Verbatim gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Messages loaded: {messages_loaded}");

    let state = Arc::new(GatewayState {
        service,
        messages_loaded,
    });

    verbatim_gateway::start(&config.gateway, state).await?;

    Ok(())
}
