/// Health check endpoints for liveness and readiness probes
///
/// Liveness only proves the process answers. Readiness also asks the content
/// store a cheap query, since neither listing can load without it.
use crate::{context::AppContext, jobs};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use std::time::Instant;

/// Readiness response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessStatus {
    /// "ready" or "unavailable"
    pub status: String,
    pub version: String,
    pub content_backend: String,
    pub response_time_ms: u64,
    pub active_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe - 503 when the content store does not answer
pub async fn readiness_probe(State(ctx): State<AppContext>) -> (StatusCode, Json<ReadinessStatus>) {
    let start = Instant::now();
    let result = jobs::tasks::health_check(&ctx).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    let (status_code, status, error) = match result {
        Ok(()) => (StatusCode::OK, "ready", None),
        Err(e) => {
            tracing::warn!(error = %e, "readiness_probe_failed: content store check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", Some(e.to_string()))
        }
    };

    (
        status_code,
        Json(ReadinessStatus {
            status: status.to_string(),
            version: ctx.config.service.version.clone(),
            content_backend: ctx.content.backend_tag().to_string(),
            response_time_ms,
            active_sessions: ctx.sessions.len().await,
            error,
        }),
    )
}
