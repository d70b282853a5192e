use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::export::{ExportError, PdfExporter, PreviewPage, View};
use crate::identity::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    /// Markdown currently in the preview. Falls back to the saved resume.
    pub markdown: Option<String>,
}

/// POST /api/v1/resume/export
pub async fn handle_export(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let _permit = state
        .export_gate
        .try_acquire(current.user.id)
        .ok_or(ExportError::InProgress)?;

    let markdown = match req.markdown.filter(|m| !m.trim().is_empty()) {
        Some(markdown) => markdown,
        None => state
            .resumes
            .find_for_user(current.user.id)
            .await?
            .map(|r| r.content)
            .ok_or_else(|| AppError::NotFound("No saved resume to export".to_string()))?,
    };

    // The builder page opens on the edit view; the exporter switches it.
    let mut page = PreviewPage::builder_page(markdown, View::Edit);
    let exporter = PdfExporter::new(state.converter.clone());
    let document = exporter.export(&mut page).await?;

    info!(
        "Exported {} ({} pages, {} bytes) for user {}",
        document.filename,
        document.page_count,
        document.bytes.len(),
        current.user.id
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.filename),
            ),
        ],
        document.bytes,
    )
        .into_response())
}
