//! Query orchestration — one question through the full pipeline.
//!
//! Per-request state machine:
//!
//! ```text
//! Received → ContextAssembled → PromptBuilt → AwaitingModel
//!          → (Validated | RepairRequested | RepairExhausted) → Completed
//! ```
//!
//! `RepairRequested` loops back to `AwaitingModel` up to the configured
//! bound; `RepairExhausted` transitions deterministically to the extractive
//! fallback. `Completed` always yields exactly one Answer. No state is
//! persisted beyond a single request's lifetime.

use crate::assembler::ContextAssembler;
use crate::prompt::PromptBuilder;
use crate::synthesizer::AnswerSynthesizer;
use crate::validator::{AnswerValidator, Verdict};
use std::sync::Arc;
use tracing::{debug, info};
use verbatim_core::error::QueryError;
use verbatim_core::{Answer, Question};
use verbatim_transcript::TranscriptStore;

/// Processing phases of one question, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryState {
    Received,
    ContextAssembled,
    PromptBuilt,
    AwaitingModel,
    Validated,
    RepairRequested,
    RepairExhausted,
    Completed,
}

/// Orchestrates assembly, prompting, synthesis, and validation per
/// incoming question. Shareable across concurrent requests — all fields
/// are read-only after construction.
#[derive(Debug)]
pub struct QueryService {
    store: Arc<TranscriptStore>,
    assembler: ContextAssembler,
    builder: PromptBuilder,
    synthesizer: AnswerSynthesizer,
    validator: AnswerValidator,
    repair_attempts: u32,
}

impl QueryService {
    pub fn new(
        store: Arc<TranscriptStore>,
        assembler: ContextAssembler,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            store,
            assembler,
            builder: PromptBuilder::new(),
            synthesizer,
            validator: AnswerValidator::new(),
            repair_attempts: 2,
        }
    }

    /// Set the maximum number of repair re-prompts before the extractive
    /// fallback.
    pub fn with_repair_attempts(mut self, attempts: u32) -> Self {
        self.repair_attempts = attempts;
        self
    }

    /// Swap the validator (e.g. for a custom overlap threshold).
    pub fn with_validator(mut self, validator: AnswerValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Answer one question. Always yields exactly one Answer unless the
    /// model backend is exhausted, which surfaces as a service-level error.
    pub async fn ask(&self, question: Question) -> Result<Answer, QueryError> {
        if question.text.trim().is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let mut state = QueryState::Received;
        debug!(?state, question = %question.text, "Question received");

        let context = self.assembler.assemble(self.store.all(), &question);
        state = QueryState::ContextAssembled;
        debug!(
            ?state,
            messages = context.messages.len(),
            tokens = context.token_count,
            "Context assembled"
        );

        let mut prompt = self.builder.build(&context, &question);
        state = QueryState::PromptBuilt;
        debug!(?state, prompt_chars = prompt.text.len(), "Prompt built");

        // Initial attempt plus up to `repair_attempts` corrective rounds.
        for round in 0..=self.repair_attempts {
            state = QueryState::AwaitingModel;
            debug!(?state, round, "Calling model");

            let raw = self.synthesizer.synthesize(&prompt).await?;

            match self.validator.validate(&raw, &context) {
                Verdict::Accepted(answer) => {
                    state = QueryState::Validated;
                    debug!(?state, status = ?answer.status, "Response accepted");
                    state = QueryState::Completed;
                    info!(
                        ?state,
                        status = ?answer.status,
                        sources = answer.provenance.len(),
                        "Question completed"
                    );
                    return Ok(answer);
                }
                Verdict::Repair(violation) if round < self.repair_attempts => {
                    state = QueryState::RepairRequested;
                    debug!(?state, round, %violation, "Requesting repair");
                    prompt = self.builder.repair(&context, &question, &violation);
                }
                Verdict::Repair(violation) => {
                    state = QueryState::RepairExhausted;
                    debug!(?state, %violation, "Repairs exhausted, using extractive fallback");
                    let answer = self.validator.fallback(&context, &question);
                    state = QueryState::Completed;
                    info!(
                        ?state,
                        status = ?answer.status,
                        sources = answer.provenance.len(),
                        "Question completed via fallback"
                    );
                    return Ok(answer);
                }
            }
        }

        // The loop always returns: every round either accepts, repairs, or
        // falls back on the last round.
        unreachable!("repair loop must terminate with an answer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::SENTINEL;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use std::time::Duration;
    use verbatim_core::error::ModelError;
    use verbatim_core::provider::{GenerateRequest, GenerateResponse, ModelProvider};
    use verbatim_core::{AnswerStatus, MessageId, Transcript, TranscriptMessage};

    /// Replays a fixed script of responses, recording every prompt.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<String, ModelError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String, ModelError>>) -> Self {
            Self {
                script: Mutex::new(script),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn always(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string()); 16])
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: GenerateRequest,
        ) -> std::result::Result<GenerateResponse, ModelError> {
            self.prompts.lock().unwrap().push(request.prompt);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(ModelError::Network("script exhausted".into()));
            }
            script.remove(0).map(|text| GenerateResponse {
                text,
                model: "scripted-1".into(),
            })
        }
    }

    fn msg(id: &str, minute: u32, author: &str, text: &str) -> TranscriptMessage {
        TranscriptMessage {
            id: MessageId::new(id),
            author: author.into(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap(),
            text: text.into(),
        }
    }

    /// The Vikram message among 29 unrelated ones.
    fn team_transcript() -> Transcript {
        let mut messages = Vec::new();
        for i in 0..29u32 {
            messages.push(msg(
                &format!("noise-{i}"),
                i,
                "Sam",
                &format!("status update number {i} with nothing special going on"),
            ));
        }
        messages.push(msg(
            "vikram-cars",
            40,
            "Vikram",
            "I have 3 cars, a sedan, an SUV, and a hatchback.",
        ));
        Transcript::new(messages)
    }

    fn service(provider: Arc<ScriptedProvider>) -> QueryService {
        let store = Arc::new(TranscriptStore::new(team_transcript()));
        let synthesizer = AnswerSynthesizer::new(provider)
            .with_retry(2, Duration::from_millis(1))
            .with_timeout(Duration::from_secs(1));
        QueryService::new(store, ContextAssembler::new(8192), synthesizer)
    }

    #[tokio::test]
    async fn found_answer_with_provenance() {
        let provider = Arc::new(ScriptedProvider::always("Vikram has 3 cars."));
        let svc = service(provider.clone());

        let answer = svc
            .ask(Question::new("How many cars does Vikram have?"))
            .await
            .unwrap();

        assert_eq!(answer.status, AnswerStatus::Found);
        assert!(answer.text.contains("Vikram"));
        assert!(answer.text.contains('3'));
        assert_eq!(answer.provenance, vec![MessageId::new("vikram-cars")]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn absent_topic_yields_not_found() {
        let provider = Arc::new(ScriptedProvider::always(SENTINEL));
        let svc = service(provider);

        let answer = svc
            .ask(Question::new("What is the capital of France?"))
            .await
            .unwrap();

        assert_eq!(answer.status, AnswerStatus::NotFound);
        assert_eq!(answer.text, SENTINEL);
        assert!(answer.provenance.is_empty());
    }

    #[tokio::test]
    async fn repair_loop_is_bounded_then_falls_back() {
        // Always two sentences: never passes validation.
        let provider = Arc::new(ScriptedProvider::always(
            "Vikram has 3 cars. He likes them a lot.",
        ));
        let svc = service(provider.clone()).with_repair_attempts(2);

        let answer = svc
            .ask(Question::new("How many cars does Vikram have?"))
            .await
            .unwrap();

        // 1 initial + 2 repairs, then the extractive fallback.
        assert_eq!(provider.calls(), 3);
        assert_eq!(answer.status, AnswerStatus::Found);
        assert_eq!(answer.text, "I have 3 cars, a sedan, an SUV, and a hatchback.");
        assert_eq!(answer.provenance, vec![MessageId::new("vikram-cars")]);
    }

    #[tokio::test]
    async fn repair_prompt_names_violation_and_second_try_wins() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("Vikram has 3 cars. He likes them.".into()),
            Ok("Vikram has 3 cars.".into()),
        ]));
        let svc = service(provider.clone());

        let answer = svc
            .ask(Question::new("How many cars does Vikram have?"))
            .await
            .unwrap();

        assert_eq!(answer.status, AnswerStatus::Found);
        assert_eq!(provider.calls(), 2);
        assert!(provider.prompt(0).contains("Non-negotiable rules"));
        assert!(provider.prompt(1).contains("previous reply was rejected"));
    }

    #[tokio::test]
    async fn invented_words_trigger_repair() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("Vikram owns three vehicles.".into()),
            Ok("Vikram has 3 cars.".into()),
        ]));
        let svc = service(provider.clone());

        let answer = svc
            .ask(Question::new("How many cars does Vikram have?"))
            .await
            .unwrap();

        assert_eq!(answer.status, AnswerStatus::Found);
        assert!(provider.prompt(1).contains("words absent from the messages"));
        assert_eq!(answer.text, "Vikram has 3 cars.");
    }

    #[tokio::test]
    async fn fallback_below_threshold_is_not_found() {
        // Model keeps emitting garbage; question shares no words with the
        // transcript, so even the fallback finds nothing.
        let provider = Arc::new(ScriptedProvider::always("Paris is the capital."));
        let svc = service(provider);

        let answer = svc
            .ask(Question::new("Quelle est la capitale?"))
            .await
            .unwrap();

        assert_eq!(answer.status, AnswerStatus::NotFound);
        assert_eq!(answer.text, SENTINEL);
        assert!(answer.provenance.is_empty());
    }

    #[tokio::test]
    async fn synthesis_exhaustion_is_a_service_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ModelError::Network("down".into())),
            Err(ModelError::Network("still down".into())),
        ]));
        let svc = service(provider);

        let err = svc
            .ask(Question::new("How many cars does Vikram have?"))
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::SynthesisFailed(_)));
    }

    #[tokio::test]
    async fn fatal_upstream_error_surfaces_immediately() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ModelError::AuthenticationFailed("bad key".into()),
        )]));
        let svc = service(provider);

        let err = svc.ask(Question::new("Anything?")).await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::SynthesisFailed(ModelError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn empty_question_rejected() {
        let provider = Arc::new(ScriptedProvider::always("irrelevant"));
        let svc = service(provider.clone());

        let err = svc.ask(Question::new("   ")).await.unwrap_err();
        assert!(matches!(err, QueryError::EmptyQuestion));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn empty_transcript_still_answers_not_found() {
        let provider = Arc::new(ScriptedProvider::always(SENTINEL));
        let store = Arc::new(TranscriptStore::new(Transcript::default()));
        let synthesizer = AnswerSynthesizer::new(provider.clone())
            .with_retry(1, Duration::from_millis(1));
        let svc = QueryService::new(store, ContextAssembler::new(8192), synthesizer);

        let answer = svc.ask(Question::new("Anything at all?")).await.unwrap();
        assert_eq!(answer.status, AnswerStatus::NotFound);
        // Synthesis still ran against the empty context.
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_questions_share_the_service() {
        let provider = Arc::new(ScriptedProvider::always("Vikram has 3 cars."));
        let svc = Arc::new(service(provider));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.ask(Question::new("How many cars does Vikram have?")).await
            }));
        }

        for handle in handles {
            let answer = handle.await.unwrap().unwrap();
            assert_eq!(answer.status, AnswerStatus::Found);
        }
    }
}
