use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Response, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::client::ChutesClient;
use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::metrics::{MetricsSnapshot, RetryMetrics};
use crate::models::openai::{ChatRequest, ModelList};
use crate::provider::Upstream;
use crate::retry::{RetryController, RetryPolicy};
use crate::state::ClearanceStore;
use crate::streaming::{collect_completion, frames, transform_to_sse};
use crate::transform::{supported_models, transform_request, validate_chat_request};

pub struct AppState {
    pub config: ProxyConfig,
    pub clearance: ClearanceStore,
    pub metrics: Arc<RetryMetrics>,
    pub retry: RetryController,
}

impl AppState {
    /// Wire the shared state around an arbitrary upstream
    pub fn new(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        let clearance = ClearanceStore::new();
        let metrics = Arc::new(RetryMetrics::new());
        let retry = RetryController::new(
            upstream,
            clearance.clone(),
            RetryPolicy::from(&config.upstream),
            metrics.clone(),
        );

        Self {
            config,
            clearance,
            metrics,
            retry,
        }
    }

    /// Build state backed by the real Chutes client
    pub fn from_config(config: ProxyConfig) -> Result<Self> {
        let upstream = ChutesClient::new(config.upstream.clone(), config.auth.token.clone())?;
        Ok(Self::new(config, Arc::new(upstream)))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/v1/models", get(handle_models))
        .route("/v1/chat/completions", post(handle_chat_completions))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub has_auth_token: bool,
    pub has_cf_clearance: bool,
    pub profile: &'static str,
    pub metrics: MetricsSnapshot,
}

pub async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "Chutes API Service Running",
        version: "1.0",
        has_auth_token: state.config.auth.is_enabled(),
        has_cf_clearance: state.clearance.is_present(),
        profile: state.config.upstream.profile.name(),
        metrics: state.metrics.snapshot(),
    })
}

pub async fn handle_models(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = check_auth(&state.config, &headers) {
        return e.into_response();
    }

    Json(ModelList::from_ids(supported_models())).into_response()
}

pub async fn handle_chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    match chat_completions(&state, &headers, body).await {
        Ok(response) => response,
        Err(e) => {
            error!(status = %e.status_code(), "Chat completion failed: {}", e);
            e.into_response()
        }
    }
}

async fn chat_completions(
    state: &AppState,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response<Body>> {
    check_auth(&state.config, headers)?;

    let chat_req: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| ProxyError::InvalidRequest(format!("Malformed JSON body: {}", e)))?;
    validate_chat_request(&chat_req)?;

    info!(
        model = %chat_req.model,
        stream = chat_req.stream,
        messages = chat_req.messages.len(),
        "Received chat request"
    );

    let envelope = transform_request(&chat_req)?;
    let upstream = state.retry.send(&envelope).await?;
    let frames = frames(upstream.body);

    if chat_req.stream {
        let sse_stream = transform_to_sse(frames, chat_req.model);
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(sse_stream))
            .map_err(|e| ProxyError::InternalError(format!("Failed to build response: {}", e)))
    } else {
        let completion = collect_completion(frames, &chat_req.model).await?;
        Ok(Json(completion).into_response())
    }
}

/// Compare the caller's `Authorization` header with the configured token
///
/// Always passes when no token is configured.
pub fn check_auth(config: &ProxyConfig, headers: &HeaderMap) -> Result<()> {
    let Some(token) = config.auth.token.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided == format!("Bearer {}", token) {
        Ok(())
    } else {
        Err(ProxyError::Unauthorized)
    }
}
