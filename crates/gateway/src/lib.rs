//! HTTP API gateway for Verbatim.
//!
//! Exposes the question-answering service over REST:
//! `POST /ask` for questions, `GET /health` for liveness.
//!
//! Built on Axum for async HTTP.

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use verbatim_core::error::QueryError;
use verbatim_core::{AnswerStatus, Question};
use verbatim_engine::QueryService;

/// Shared application state for the gateway. Read-only after startup:
/// the transcript is fixed and the service holds no per-request state.
pub struct GatewayState {
    pub service: QueryService,
    pub messages_loaded: usize,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server and serve until interrupted.
pub async fn start(
    config: &verbatim_config::GatewayConfig,
    state: SharedState,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    messages_loaded: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        messages_loaded: state.messages_loaded,
    })
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<String>,
    status: AnswerStatus,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

async fn ask_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, (StatusCode, Json<ErrorResponse>)> {
    // A body axum cannot parse into AskRequest still gets the taxonomy
    // error shape, not the extractor's plain-text rejection.
    let Json(payload) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_request",
                detail: rejection.body_text(),
            }),
        )
    })?;

    info!(question_len = payload.question.len(), "ask request");

    match state.service.ask(Question::new(&payload.question)).await {
        Ok(answer) => Ok(Json(AskResponse {
            answer: answer.text,
            sources: answer.provenance.into_iter().map(|id| id.0).collect(),
            status: answer.status,
        })),
        Err(e @ QueryError::EmptyQuestion) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_request",
                detail: e.to_string(),
            }),
        )),
        Err(e @ QueryError::SynthesisFailed(_)) => {
            warn!(error = %e, "Answer synthesis failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "synthesis_failed",
                    detail: e.to_string(),
                }),
            ))
        }
    }
}
