/// Contact form endpoints
use crate::{
    contact::{send_submission, ContactFormSnapshot, FormField, FormPhase, SubmitOutcome},
    context::AppContext,
    error::{PortfolioError, PortfolioResult},
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Build contact form routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/sessions/:session_id/contact", get(get_form))
        .route("/api/sessions/:session_id/contact/fields", put(update_field))
        .route("/api/sessions/:session_id/contact/submit", post(submit_form))
        .route("/api/sessions/:session_id/contact/reset", post(reset_form))
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub field: FormField,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
    pub form: ContactFormSnapshot,
}

async fn get_form(
    State(ctx): State<AppContext>,
    Path(session_id): Path<Uuid>,
) -> PortfolioResult<Json<ContactFormSnapshot>> {
    let session = ctx.sessions.get(session_id).await?;
    let form = session.contact.lock().await;
    Ok(Json(form.snapshot()))
}

async fn update_field(
    State(ctx): State<AppContext>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateFieldRequest>,
) -> PortfolioResult<Json<ContactFormSnapshot>> {
    let session = ctx.sessions.get(session_id).await?;
    let mut form = session.contact.lock().await;
    form.update_field(req.field, req.value)?;
    Ok(Json(form.snapshot()))
}

/// Validate and send the form
///
/// The form lock is released while the create call is in flight; other
/// requests see the form as `submitting` until it settles. The create call
/// and its settlement run on a spawned task, so a dropped request still
/// leaves the form `submitted` or back in `editing`.
async fn submit_form(
    State(ctx): State<AppContext>,
    Path(session_id): Path<Uuid>,
) -> PortfolioResult<Json<SubmitResponse>> {
    let session = ctx.sessions.get(session_id).await?;

    let submission = {
        let mut form = session.contact.lock().await;
        // Only sends count against the quota
        if form.phase() == FormPhase::Editing && form.validate().is_empty() {
            ctx.rate_limiter.check_submission()?;
        }
        form.begin_submit()?
    };

    let outcome = match submission {
        None => SubmitOutcome::Invalid,
        Some(submission) => {
            let content = ctx.content.clone();
            let settling = session.clone();
            tokio::spawn(async move {
                let result = send_submission(content.as_ref(), &submission).await;
                settling.contact.lock().await.finish_submit(result)
            })
            .await
            .map_err(|e| PortfolioError::Internal(format!("Submission task failed: {}", e)))??
        }
    };

    let form = session.contact.lock().await.snapshot();
    Ok(Json(SubmitResponse { outcome, form }))
}

async fn reset_form(
    State(ctx): State<AppContext>,
    Path(session_id): Path<Uuid>,
) -> PortfolioResult<Json<ContactFormSnapshot>> {
    let session = ctx.sessions.get(session_id).await?;
    let mut form = session.contact.lock().await;
    form.reset()?;
    Ok(Json(form.snapshot()))
}
