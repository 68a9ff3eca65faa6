use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Resume analysis document. Holds placeholder values until a downstream
/// analyzer fills in the score and skill lists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisRow {
    pub has_resume: bool,
    pub file_name: String,
    pub object_key: String,
    pub uploaded_at: DateTime<Utc>,
    pub score: i32,
    pub detected_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}
