//! HTTP gateway for assetwright.
//!
//! Exposes the protocol classifier, one-shot configuration, and the
//! multi-turn session API:
//!
//! - `GET  /health`
//! - `POST /api/selector`  route free text to a domain
//! - `POST /api/target`    configure a domain from one prompt
//! - `/v1/sessions/...`    iterative sessions (see [`api_v1`])
//!
//! Built on Axum.

pub mod api_v1;

#[cfg(test)]
pub(crate) mod test_helpers;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use assetwright_config::{AppConfig, DomainsConfig};
use assetwright_core::{Domain, Provider};
use assetwright_corpus::CorpusStore;
use assetwright_engine::{
    Classification, ClassifyError, ConfigEngine, ConfigState, ExtractionError, OracleClient, ProtocolClassifier,
    Session, SessionError,
};

/// Maximum number of in-memory sessions before the oldest are evicted.
const MAX_SESSIONS: usize = 1_000;

/// A live session plus the bookkeeping needed for eviction.
pub struct SessionSlot {
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub session: Arc<Mutex<Session>>,
}

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ConfigEngine>,
    pub classifier: Arc<ProtocolClassifier>,
    pub domains: DomainsConfig,
    pub sessions: RwLock<HashMap<Uuid, SessionSlot>>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(engine: ConfigEngine, domains: DomainsConfig) -> Self {
        let classifier = ProtocolClassifier::new(engine.oracle().clone());
        Self {
            engine: Arc::new(engine),
            classifier: Arc::new(classifier),
            domains,
            sessions: RwLock::new(HashMap::new()),
            start_time: chrono::Utc::now(),
        }
    }

    /// Wire the engine from configuration around an oracle provider.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Self {
        let oracle = OracleClient::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_timeout(config.oracle.timeout());

        let mut engine = ConfigEngine::new(Arc::new(oracle));
        if config.corpus.record_interactions {
            engine = engine.with_corpus(Arc::new(CorpusStore::new(config.corpus_dir())));
        }
        Self::new(engine, config.domains.clone())
    }

    /// Start a session with the domain's configured policy and register it.
    pub async fn open_session(&self, domain: Domain) -> (Uuid, Arc<Mutex<Session>>) {
        let session = self.engine.start_session(domain, self.domains.policy_for(domain));
        let id = session.id();
        let slot = SessionSlot {
            created_at: session.created_at(),
            session: Arc::new(Mutex::new(session)),
        };
        let handle = slot.session.clone();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= MAX_SESSIONS
            && let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.created_at)
                .map(|(id, _)| *id)
        {
            sessions.remove(&oldest);
        }
        sessions.insert(id, slot);
        (id, handle)
    }

    pub async fn session(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).map(|slot| slot.session.clone())
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS for browser front ends
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/selector", post(selector_handler))
        .route("/api/target", post(target_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = assetwright_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or("No default provider configured. Set an API key or run `assetwright onboard`.")?;

    let state = Arc::new(GatewayState::from_config(&config, provider));
    let app = build_router(state);

    info!(addr = %addr, model = %config.default_model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Errors ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

pub(crate) fn classify_error(e: ClassifyError) -> ApiError {
    match e {
        ClassifyError::Rejected(_) => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        ClassifyError::Oracle(_) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

pub(crate) fn extraction_error(e: &ExtractionError) -> ApiError {
    match e {
        ExtractionError::NoObjectFound => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.user_hint()),
        ExtractionError::Oracle(_) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

pub(crate) fn session_error(e: SessionError) -> ApiError {
    api_error(StatusCode::CONFLICT, e.to_string())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sessions: usize,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions.read().await.len(),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
    })
}

#[derive(Deserialize)]
struct SelectorRequest {
    user_input: String,
}

/// `POST /api/selector`: classify free text into a target domain.
async fn selector_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SelectorRequest>,
) -> Result<Json<Classification>, ApiError> {
    info!(input_len = payload.user_input.len(), "Selector request");
    state
        .classifier
        .classify(&payload.user_input)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "Classification failed");
            classify_error(e)
        })
}

#[derive(Deserialize)]
struct TargetRequest {
    target: Domain,
    prompt: String,
}

#[derive(Serialize)]
struct TargetResponse {
    session_id: Uuid,
    target: Domain,
    configuration: ConfigState,
    changed_fields: Vec<&'static str>,
    coercions: Vec<assetwright_engine::ValidationCoercion>,
}

/// `POST /api/target`: build a configuration for one domain from a prompt.
///
/// The session stays open so the caller can refine it under `/v1/sessions`.
async fn target_handler(
    State(state): State<SharedState>,
    Json(payload): Json<TargetRequest>,
) -> Result<Json<TargetResponse>, ApiError> {
    info!(domain = %payload.target, "Target request");
    let (session_id, handle) = state.open_session(payload.target).await;
    let mut session = handle.lock().await;

    let outcome = state
        .engine
        .turn(&mut session, &payload.prompt)
        .await
        .map_err(session_error)?;

    if let Some(warning) = &outcome.warning {
        return Err(extraction_error(warning));
    }
    let configuration = outcome
        .state
        .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "turn produced no configuration"))?;

    Ok(Json(TargetResponse {
        session_id,
        target: payload.target,
        configuration,
        changed_fields: outcome.changed_fields,
        coercions: outcome.coercions,
    }))
}
