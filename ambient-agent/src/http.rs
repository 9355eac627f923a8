//! HTTP API (C7, §4.7): localhost-only endpoints for the browser
//! extension. Router construction follows the donor gateway's style
//! (`backend-rust-gateway/src/main.rs::main`), but the CORS layer enforces
//! an allow-list instead of the donor's blanket `Any`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::orchestrator::Orchestrator;
use crate::state::SharedState;

#[derive(Clone)]
struct ApiState {
    app: SharedState,
    orchestrator: Arc<Orchestrator>,
}

pub fn router(app: SharedState, orchestrator: Arc<Orchestrator>) -> Router {
    let port = app.config.extension.port;
    let state = ApiState { app, orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/api/enhance", post(enhance))
        .route("/api/memories/search", get(memories_search))
        .route("/api/status", get(status))
        .layer(cors_layer(port))
        .with_state(state)
}

/// §4.7 "CORS": allow `chrome-extension://*` by prefix and the
/// configured loopback origins, rejecting everything else outright
/// (no `Access-Control-Allow-*` headers on the response).
fn cors_layer(port: u16) -> CorsLayer {
    let localhost = format!("http://localhost:{port}");
    let loopback = format!("http://127.0.0.1:{port}");

    CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let Ok(origin) = origin.to_str() else {
                return false;
            };
            origin.starts_with("chrome-extension://") || origin == localhost || origin == loopback
        }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: chrono::DateTime<Utc>,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        service: "ambient-memory-agent",
        timestamp: Utc::now(),
    })
}

#[derive(Deserialize)]
struct EnhanceRequest {
    prompt: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    max_memories: Option<i64>,
}

#[derive(Serialize)]
struct EnhanceResponse {
    original_prompt: String,
    enhanced_prompt: String,
    memories_used: Vec<String>,
    memory_count: usize,
    enhancement_type: ambient_core::EnhancementType,
}

const DEFAULT_MAX_MEMORIES: usize = 5;

async fn enhance(
    State(state): State<ApiState>,
    Json(request): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, (StatusCode, String)> {
    if request.prompt.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "prompt must not be empty".to_string()));
    }

    let max_memories = request
        .max_memories
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_MAX_MEMORIES);

    let result = state
        .app
        .enhancer
        .enhance(
            &state.app.store,
            &request.prompt,
            request.context.as_deref(),
            max_memories,
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "enhance failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(EnhanceResponse {
        original_prompt: result.original_prompt,
        enhanced_prompt: result.enhanced_prompt,
        memory_count: result.memories_used.len(),
        memories_used: result.memories_used,
        enhancement_type: result.enhancement_type,
    }))
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    memories: Vec<String>,
    count: usize,
}

const DEFAULT_SEARCH_LIMIT: usize = 5;

async fn memories_search(
    State(state): State<ApiState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = match params.q {
        Some(q) if !q.trim().is_empty() => q,
        _ => return Err((StatusCode::BAD_REQUEST, "q is required".to_string())),
    };
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let results = state.app.store.search(&query, limit).await.map_err(|e| {
        warn!(error = %e, "memory search failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let memories: Vec<String> = results.into_iter().map(|r| r.memory.content).collect();
    let count = memories.len();

    Ok(Json(SearchResponse {
        query,
        memories,
        count,
    }))
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    port: u16,
    stats: StatusStats,
}

#[derive(Serialize)]
struct StatusStats {
    enhancements_made: u64,
    last_enhancement: Option<chrono::DateTime<Utc>>,
}

async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    let orchestrator_status = state.orchestrator.status().await;
    Json(StatusResponse {
        status: "running",
        port: state.app.config.extension.port,
        stats: StatusStats {
            enhancements_made: orchestrator_status.enhancements_made,
            last_enhancement: orchestrator_status.last_enhancement,
        },
    })
}
