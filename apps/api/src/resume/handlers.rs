use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::builder::form::ResumeFormState;
use crate::builder::validation::validate_form;
use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::models::ResumeRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveResumeRequest {
    /// Markdown exactly as previewed; stored verbatim.
    pub content: String,
    /// Form the markdown was built from. When sent, it must validate.
    pub form: Option<ResumeFormState>,
}

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Option<ResumeRecord>>, AppError> {
    let resume = state.resumes.find_for_user(current.user.id).await?;
    Ok(Json(resume))
}

/// POST /api/v1/resume
pub async fn handle_save_resume(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<SaveResumeRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    if let Some(form) = &req.form {
        validate_form(form)
            .into_result()
            .map_err(AppError::InvalidFields)?;
    }
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("Resume content cannot be empty".to_string()));
    }

    let resume = state.resumes.upsert(current.user.id, &req.content).await?;
    info!("Saved resume {} for user {}", resume.id, current.user.id);
    Ok(Json(resume))
}
