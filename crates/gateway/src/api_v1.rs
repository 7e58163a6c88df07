//! HTTP API v1: iterative configuration sessions.
//!
//! Endpoints:
//!
//! - `POST /v1/sessions`               create a session, optionally with a first prompt
//! - `GET  /v1/sessions/{id}`          current state of a session
//! - `POST /v1/sessions/{id}/turns`    apply one user turn
//! - `POST /v1/sessions/{id}/finish`   accept the configuration and close
//! - `POST /v1/sessions/{id}/cancel`   abandon the session
//!
//! Extraction failures are not HTTP errors here: the turn reports
//! `applied: false` with a warning and the prior configuration.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use assetwright_core::{Domain, MergePolicy};
use assetwright_engine::{ConfigState, Session, TurnOutcome, ValidationCoercion};

use crate::{ApiError, SharedState, api_error, session_error};

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{id}", get(get_session_handler))
        .route("/sessions/{id}/turns", post(turn_handler))
        .route("/sessions/{id}/finish", post(finish_handler))
        .route("/sessions/{id}/cancel", post(cancel_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateSessionRequest {
    domain: Domain,
    /// Optional first turn.
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Deserialize)]
struct TurnRequest {
    text: String,
}

#[derive(Serialize)]
pub struct SessionDto {
    pub id: Uuid,
    pub domain: Domain,
    pub policy: MergePolicy,
    pub status: String,
    pub turns: u32,
    pub configuration: Option<ConfigState>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl SessionDto {
    fn from_session(session: &Session) -> Self {
        Self {
            id: session.id(),
            domain: session.domain(),
            policy: session.policy(),
            status: session.status().to_string(),
            turns: session.turns(),
            configuration: session.state().cloned(),
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        }
    }
}

#[derive(Serialize)]
struct TurnResponse {
    session: SessionDto,
    applied: bool,
    warning: Option<String>,
    changed_fields: Vec<&'static str>,
    coercions: Vec<ValidationCoercion>,
    score: Option<f32>,
}

impl TurnResponse {
    fn new(session: &Session, outcome: TurnOutcome) -> Self {
        Self {
            session: SessionDto::from_session(session),
            applied: outcome.applied,
            warning: outcome.warning.as_ref().map(|w| w.user_hint().to_string()),
            changed_fields: outcome.changed_fields,
            coercions: outcome.coercions,
            score: outcome.score,
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn lookup_session(state: &SharedState, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
    state
        .session(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Session '{id}' not found")))
}

/// `POST /v1/sessions`
async fn create_session_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<TurnResponse>), ApiError> {
    let (id, handle) = state.open_session(payload.domain).await;
    info!(session_id = %id, domain = %payload.domain, "v1/sessions create");

    let mut session = handle.lock().await;
    let response = match payload.prompt.as_deref() {
        Some(prompt) if !prompt.trim().is_empty() => {
            let outcome = state.engine.turn(&mut session, prompt).await.map_err(session_error)?;
            TurnResponse::new(&session, outcome)
        }
        _ => TurnResponse {
            session: SessionDto::from_session(&session),
            applied: false,
            warning: None,
            changed_fields: Vec::new(),
            coercions: Vec::new(),
            score: None,
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /v1/sessions/{id}`
async fn get_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionDto>, ApiError> {
    let handle = lookup_session(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionDto::from_session(&session)))
}

/// `POST /v1/sessions/{id}/turns`
async fn turn_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let handle = lookup_session(&state, id).await?;
    let mut session = handle.lock().await;
    let outcome = state
        .engine
        .turn(&mut session, &payload.text)
        .await
        .map_err(session_error)?;
    Ok(Json(TurnResponse::new(&session, outcome)))
}

/// `POST /v1/sessions/{id}/finish`
async fn finish_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionDto>, ApiError> {
    let handle = lookup_session(&state, id).await?;
    let mut session = handle.lock().await;
    session.finish().map_err(session_error)?;
    Ok(Json(SessionDto::from_session(&session)))
}

/// `POST /v1/sessions/{id}/cancel`
async fn cancel_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionDto>, ApiError> {
    let handle = lookup_session(&state, id).await?;
    let mut session = handle.lock().await;
    session.cancel().map_err(session_error)?;
    Ok(Json(SessionDto::from_session(&session)))
}
