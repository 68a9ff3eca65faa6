//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::auth::CallerIdentity;
use crate::errors::AppError;
use crate::models::resume::ResumeAnalysisRow;
use crate::resume::upload::ResumeUpload;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/v1/resumes
///
/// Multipart body with a single `file` part (PDF, DOC or DOCX).
/// Returns the placeholder analysis document the dashboard reads.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    caller: CallerIdentity,
    mut multipart: Multipart,
) -> Result<Json<ResumeAnalysisRow>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidArgument(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidArgument(format!("Malformed upload: {e}")))?;

        upload = Some(ResumeUpload::new(
            &file_name,
            content_type.as_deref(),
            bytes,
        )?);
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::InvalidArgument("Please select a resume file to upload.".into())
    })?;

    info!("Storing resume '{}' for user {}", upload.file_name, caller.uid);
    let row = state.resumes.save(&caller.uid, upload).await?;
    Ok(Json(row))
}

/// GET /api/v1/resumes/me
pub async fn handle_get_resume_analysis(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<ResumeAnalysisRow>, AppError> {
    let row = state.resumes.get(&caller.uid).await?.ok_or_else(|| {
        AppError::NotFound("No resume analysis found for this account.".into())
    })?;
    Ok(Json(row))
}
