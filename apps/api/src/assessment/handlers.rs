//! Axum route handlers for the Assessment API.

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use crate::assessment::generator::analyze_skills;
use crate::assessment::models::SkillAssessment;
use crate::auth::CallerIdentity;
use crate::errors::AppError;
use crate::models::assessment::AssessmentRow;
use crate::state::AppState;

/// POST /api/v1/analyzeSkills
///
/// Body: `{ "answers": { frontend, backend, dsa, databases, devops, systemDesign } }`.
/// Identity is optional at extraction time so that an anonymous call is
/// reported as `unauthenticated` before the body is looked at.
pub async fn handle_analyze_skills(
    State(state): State<AppState>,
    caller: Option<CallerIdentity>,
    body: Bytes,
) -> Result<Json<SkillAssessment>, AppError> {
    let caller = caller.ok_or(AppError::Unauthenticated)?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::InvalidArgument("answers object is missing or invalid.".into()))?;

    let assessment = analyze_skills(
        Some(&caller),
        &payload,
        state.model.as_deref(),
        state.assessments.as_ref(),
    )
    .await?;

    Ok(Json(assessment))
}

/// GET /api/v1/assessments/me
///
/// Returns the caller's stored assessment, as read by the skill dashboard.
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<AssessmentRow>, AppError> {
    let row = state.assessments.get(&caller.uid).await?.ok_or_else(|| {
        AppError::NotFound("No assessment found. Please complete the questionnaire.".into())
    })?;
    Ok(Json(row))
}
