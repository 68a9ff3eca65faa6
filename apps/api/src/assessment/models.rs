use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::errors::AppError;

/// Self-rated skill levels from the questionnaire.
///
/// Ratings are kept as the exact JSON numbers the client sent so they can be
/// echoed back verbatim. The questionnaire offers 0–3 but the bound is not
/// enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answers {
    pub frontend: Number,
    pub backend: Number,
    pub dsa: Number,
    pub databases: Number,
    pub devops: Number,
    pub system_design: Number,
}

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 3.0;

impl Answers {
    /// Reads `answers` out of a request payload. All six fields must be
    /// present and be JSON numbers; extra fields are ignored.
    pub fn from_payload(payload: &Value) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidArgument("answers object is missing or invalid.".into());

        let obj = payload
            .get("answers")
            .and_then(Value::as_object)
            .ok_or_else(invalid)?;

        let field = |key: &str| rating(obj, key).ok_or_else(invalid);

        Ok(Answers {
            frontend: field("frontend")?,
            backend: field("backend")?,
            dsa: field("dsa")?,
            databases: field("databases")?,
            devops: field("devops")?,
            system_design: field("systemDesign")?,
        })
    }

    fn fields(&self) -> [(&'static str, &Number); 6] {
        [
            ("frontend", &self.frontend),
            ("backend", &self.backend),
            ("dsa", &self.dsa),
            ("databases", &self.databases),
            ("devops", &self.devops),
            ("systemDesign", &self.system_design),
        ]
    }

    /// Names of ratings outside the questionnaire's 0–3 scale.
    pub fn out_of_range(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, n)| {
                n.as_f64()
                    .map_or(true, |v| !(RATING_MIN..=RATING_MAX).contains(&v))
            })
            .map(|(name, _)| name)
            .collect()
    }

    /// Logs ratings the questionnaire could not have produced. They are still forwarded.
    pub fn warn_if_out_of_range(&self) {
        let outliers = self.out_of_range();
        if !outliers.is_empty() {
            warn!("Ratings outside 0-3 forwarded verbatim: {}", outliers.join(", "));
        }
    }
}

fn rating(obj: &Map<String, Value>, key: &str) -> Option<Number> {
    match obj.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

/// Normalized assessment returned to the caller and persisted per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssessment {
    /// 0 – 100
    pub score: u32,
    pub detected_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strength_areas: Vec<String>,
    pub summary: String,
    pub answers: Answers,
}
