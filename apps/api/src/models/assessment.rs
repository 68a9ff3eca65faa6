use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Persisted assessment document, one live row per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRow {
    pub score: i32,
    pub detected_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strength_areas: Vec<String>,
    pub summary: String,
    pub answers: Value,
    pub created_at: DateTime<Utc>,
}
