//! `verbatim ask` — Answer a single question and exit.

use verbatim_config::AppConfig;
use verbatim_core::{AnswerStatus, Question};

pub async fn run(
    config_path: &str,
    question: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let (service, _) = super::bootstrap(&config).await?;

    let answer = service.ask(Question::new(question)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("{}", answer.text);
    if answer.status == AnswerStatus::Found && !answer.provenance.is_empty() {
        let ids: Vec<&str> = answer.provenance.iter().map(|id| id.as_str()).collect();
        println!("Sources: {}", ids.join(", "));
    }

    Ok(())
}
