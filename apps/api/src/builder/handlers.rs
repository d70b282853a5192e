use axum::Json;
use serde::{Deserialize, Serialize};

use crate::builder::draft::{PreviewSourceKind, ResumeDraft};
use crate::builder::form::ResumeFormState;
use crate::builder::validation::{validate_form, FieldErrors};
use crate::errors::AppError;
use crate::identity::CurrentIdentity;

/// Hand-edited markdown together with the form it was edited from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownOverride {
    pub markdown: String,
    #[serde(default)]
    pub form: ResumeFormState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    #[serde(default)]
    pub form: ResumeFormState,
    pub r#override: Option<MarkdownOverride>,
    /// Previously saved markdown, shown while the form is still empty.
    pub saved_content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub markdown: String,
    pub source: PreviewSourceKind,
    /// The override was made against a different form than the current one.
    pub stale: bool,
    /// Shown inline; never blocks the preview.
    pub errors: FieldErrors,
}

/// POST /api/v1/resume/preview
pub async fn handle_preview(
    CurrentIdentity(identity): CurrentIdentity,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let display_name = identity.full_name();
    let mut draft = match req.saved_content {
        Some(saved) => ResumeDraft::from_saved(saved, display_name),
        None => ResumeDraft::new(display_name),
    };

    if let Some(edit) = req.r#override {
        draft.update_form(edit.form);
        draft.override_markdown(edit.markdown);
    }
    draft.update_form(req.form);

    Ok(Json(PreviewResponse {
        markdown: draft.markdown(),
        source: draft.source_kind(),
        stale: draft.is_stale(),
        errors: validate_form(draft.form()),
    }))
}
