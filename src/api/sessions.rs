/// Session mount/unmount endpoints
use crate::{context::AppContext, error::PortfolioResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Build session routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/sessions", post(mount_session))
        .route("/api/sessions/:session_id", delete(unmount_session))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountedSession {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Mount a page session; both listings start loading immediately
async fn mount_session(
    State(ctx): State<AppContext>,
) -> PortfolioResult<(StatusCode, Json<MountedSession>)> {
    let session = ctx.sessions.mount().await?;

    Ok((
        StatusCode::CREATED,
        Json(MountedSession {
            session_id: session.id(),
            created_at: session.created_at(),
        }),
    ))
}

async fn unmount_session(
    State(ctx): State<AppContext>,
    Path(session_id): Path<Uuid>,
) -> PortfolioResult<StatusCode> {
    ctx.sessions.unmount(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
