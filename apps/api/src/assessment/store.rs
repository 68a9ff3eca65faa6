use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use crate::assessment::models::SkillAssessment;
use crate::errors::AppError;
use crate::models::assessment::AssessmentRow;

/// Per-user assessment persistence. One live document per user; every
/// write replaces the assessment fields and stamps `created_at`.
///
/// Carried in `AppState` as `Arc<dyn AssessmentStore>`.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn merge(&self, user_id: &str, assessment: &SkillAssessment) -> Result<(), AppError>;

    async fn get(&self, user_id: &str) -> Result<Option<AssessmentRow>, AppError>;
}

pub struct PgAssessmentStore {
    pool: PgPool,
}

impl PgAssessmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssessmentStore for PgAssessmentStore {
    /// Upsert keyed by user. Concurrent writes for the same user are last-write-wins.
    async fn merge(&self, user_id: &str, assessment: &SkillAssessment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO assessments
                (user_id, score, detected_skills, missing_skills, strength_areas,
                 summary, answers, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                score = EXCLUDED.score,
                detected_skills = EXCLUDED.detected_skills,
                missing_skills = EXCLUDED.missing_skills,
                strength_areas = EXCLUDED.strength_areas,
                summary = EXCLUDED.summary,
                answers = EXCLUDED.answers,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(user_id)
        .bind(assessment.score as i32)
        .bind(&assessment.detected_skills)
        .bind(&assessment.missing_skills)
        .bind(&assessment.strength_areas)
        .bind(&assessment.summary)
        .bind(Json(&assessment.answers))
        .execute(&self.pool)
        .await?;

        info!("Stored assessment for user {user_id} (score {})", assessment.score);
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<AssessmentRow>, AppError> {
        Ok(sqlx::query_as::<_, AssessmentRow>(
            "SELECT score, detected_skills, missing_skills, strength_areas, \
             summary, answers, created_at \
             FROM assessments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
