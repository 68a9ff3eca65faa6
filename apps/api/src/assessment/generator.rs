//! Skill Assessment Generator: the `analyzeSkills` pipeline.
//!
//! Pipeline: auth check → answers validation → credential check →
//! prompt build → Gemini call → fence strip + parse → normalize → persist.
//!
//! Every failure is terminal and nothing is written unless all steps before
//! persistence succeed.

use serde_json::Value;
use tracing::{error, info};

use crate::assessment::models::{Answers, SkillAssessment};
use crate::assessment::normalize::normalize_assessment;
use crate::assessment::prompts::build_assessment_prompt;
use crate::assessment::store::AssessmentStore;
use crate::auth::CallerIdentity;
use crate::errors::AppError;
use crate::llm_client::{parse_json_text, GenerativeModel};

/// Runs one assessment for the caller and returns the normalized result.
///
/// `model` is `None` when no Gemini credential was configured at startup.
pub async fn analyze_skills(
    caller: Option<&CallerIdentity>,
    payload: &Value,
    model: Option<&dyn GenerativeModel>,
    store: &dyn AssessmentStore,
) -> Result<SkillAssessment, AppError> {
    let caller = caller.ok_or(AppError::Unauthenticated)?;

    let answers = Answers::from_payload(payload)?;
    answers.warn_if_out_of_range();

    let model = model.ok_or_else(|| {
        AppError::FailedPrecondition("Gemini API key is not configured.".to_string())
    })?;

    let prompt = build_assessment_prompt(&answers);

    let raw_text = model.generate(&prompt).await.map_err(|e| {
        error!("Error calling Gemini: {e}");
        AppError::Llm("Failed to call Gemini API.".to_string())
    })?;

    let parsed = parse_json_text(&raw_text).map_err(|e| {
        error!("Failed to parse Gemini JSON: {raw_text:?}: {e}");
        AppError::Llm("Gemini response was not valid JSON.".to_string())
    })?;

    let assessment = normalize_assessment(&parsed, answers);

    store.merge(&caller.uid, &assessment).await?;

    info!(
        "Assessment complete for user {}: score={}, detected={}, missing={}",
        caller.uid,
        assessment.score,
        assessment.detected_skills.len(),
        assessment.missing_skills.len()
    );

    Ok(assessment)
}
