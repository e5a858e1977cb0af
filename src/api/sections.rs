/// Listing section endpoints
///
/// `projects` and `skills` share one set of handlers; the section path
/// segment picks which of the session's listings they act on.
use crate::{
    context::AppContext,
    error::{PortfolioError, PortfolioResult},
    listing::{ListSnapshot, SelectOutcome},
    session::PortfolioSession,
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Build section routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/sessions/:session_id/sections/:section", get(get_section))
        .route(
            "/api/sessions/:session_id/sections/:section/category",
            post(select_category),
        )
        .route("/api/sessions/:session_id/sections/:section/retry", post(retry_section))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Projects,
    Skills,
}

#[derive(Debug, Deserialize)]
pub struct SelectCategoryRequest {
    pub category: String,
}

#[derive(Debug, Serialize)]
struct CategoryResponse<C> {
    outcome: SelectOutcome,
    section: ListSnapshot<C>,
}

async fn section_snapshot(session: &PortfolioSession, section: Section) -> Response {
    match section {
        Section::Projects => Json(session.projects.snapshot().await).into_response(),
        Section::Skills => Json(session.skills.snapshot().await).into_response(),
    }
}

async fn get_section(
    State(ctx): State<AppContext>,
    Path((session_id, section)): Path<(Uuid, Section)>,
) -> PortfolioResult<Response> {
    let session = ctx.sessions.get(session_id).await?;
    Ok(section_snapshot(&session, section).await)
}

/// Change the selected category of one listing
async fn select_category(
    State(ctx): State<AppContext>,
    Path((session_id, section)): Path<(Uuid, Section)>,
    Json(req): Json<SelectCategoryRequest>,
) -> PortfolioResult<Response> {
    if req.category.trim().is_empty() {
        return Err(PortfolioError::Validation("Category cannot be empty".to_string()));
    }

    let session = ctx.sessions.get(session_id).await?;
    let response = match section {
        Section::Projects => {
            let outcome = session.projects.select_category(&req.category).await;
            reject_not_ready(outcome)?;
            Json(CategoryResponse {
                outcome,
                section: session.projects.snapshot().await,
            })
            .into_response()
        }
        Section::Skills => {
            let outcome = session.skills.select_category(&req.category).await;
            reject_not_ready(outcome)?;
            Json(CategoryResponse {
                outcome,
                section: session.skills.snapshot().await,
            })
            .into_response()
        }
    };

    Ok(response)
}

fn reject_not_ready(outcome: SelectOutcome) -> PortfolioResult<()> {
    match outcome {
        SelectOutcome::NotReady => Err(PortfolioError::Conflict(
            "categories are only selectable once the listing has loaded".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Reload a listing whose last load failed
async fn retry_section(
    State(ctx): State<AppContext>,
    Path((session_id, section)): Path<(Uuid, Section)>,
) -> PortfolioResult<Response> {
    let session = ctx.sessions.get(session_id).await?;
    let phase = match section {
        Section::Projects => session.projects.retry().await?,
        Section::Skills => session.skills.retry().await?,
    };

    tracing::debug!(session = %session_id, ?section, %phase, "listing retried");
    Ok(section_snapshot(&session, section).await)
}
