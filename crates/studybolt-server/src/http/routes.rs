use super::{chat, search, AppState};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/chat", post(chat::chat))
        .route("/api/search", post(search::search))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "name": "StudyBolt API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/chat": "Main chat endpoint (set enableSearch: true for web search)",
            "POST /api/search": "Dedicated search endpoint",
            "GET /health": "Health check",
            "GET /metrics": "Prometheus metrics",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Response {
    let cache = state.pipeline.cache();
    match cache.ping().await {
        Ok(()) => Json(json!({
            "status": "ok",
            "timestamp": Utc::now(),
            "agentId": state.pipeline.agent_id(),
            "redis": "connected",
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!("Health check: {} cache unreachable: {}", cache.name(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "redis": "disconnected",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn metrics(State(state): State<AppState>) -> Response {
    state
        .metrics
        .uptime_seconds
        .set(state.start_time.elapsed().as_secs() as i64);

    match state.metrics.render() {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
