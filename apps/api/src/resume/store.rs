use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::resume::ResumeAnalysisRow;
use crate::resume::upload::ResumeUpload;

const RESUME_COLUMNS: &str = "has_resume, file_name, object_key, uploaded_at, \
                              score, detected_skills, missing_skills";

/// Stores resume files and their per-user analysis document.
///
/// Carried in `AppState` as `Arc<dyn ResumeStore>`.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Stores the file, then merge-writes the placeholder document
    /// (`has_resume = true`, score 0, empty skill lists).
    async fn save(
        &self,
        user_id: &str,
        upload: ResumeUpload,
    ) -> Result<ResumeAnalysisRow, AppError>;

    async fn get(&self, user_id: &str) -> Result<Option<ResumeAnalysisRow>, AppError>;
}

/// Blob storage for uploaded resume files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<(), AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<(), AppError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("Resume upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{key} ({size} bytes)", self.bucket);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("Resume delete failed: {e}")))?;
        Ok(())
    }
}

pub struct PgResumeStore {
    pool: PgPool,
    objects: Arc<dyn ObjectStore>,
}

impl PgResumeStore {
    pub fn new(pool: PgPool, objects: Arc<dyn ObjectStore>) -> Self {
        Self { pool, objects }
    }

    async fn upsert_placeholder(
        &self,
        user_id: &str,
        file_name: &str,
        object_key: &str,
    ) -> Result<ResumeAnalysisRow, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO resume_analysis
                (user_id, has_resume, file_name, object_key, uploaded_at,
                 score, detected_skills, missing_skills)
            VALUES ($1, TRUE, $2, $3, NOW(), 0, '{{}}', '{{}}')
            ON CONFLICT (user_id) DO UPDATE SET
                has_resume = TRUE,
                file_name = EXCLUDED.file_name,
                object_key = EXCLUDED.object_key,
                uploaded_at = EXCLUDED.uploaded_at,
                score = EXCLUDED.score,
                detected_skills = EXCLUDED.detected_skills,
                missing_skills = EXCLUDED.missing_skills
            RETURNING {RESUME_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ResumeAnalysisRow>(&sql)
            .bind(user_id)
            .bind(file_name)
            .bind(object_key)
            .fetch_one(&self.pool)
            .await
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    /// A failed document write removes the just-uploaded object so no file
    /// is left without a row pointing at it.
    async fn save(
        &self,
        user_id: &str,
        upload: ResumeUpload,
    ) -> Result<ResumeAnalysisRow, AppError> {
        let object_key = upload.object_key(user_id);
        self.objects
            .put(&object_key, &upload.content_type, upload.bytes)
            .await?;

        match self
            .upsert_placeholder(user_id, &upload.file_name, &object_key)
            .await
        {
            Ok(row) => Ok(row),
            Err(e) => {
                error!("Resume document write failed for {object_key}: {e}");
                if let Err(cleanup) = self.objects.delete(&object_key).await {
                    warn!("Orphaned resume object {object_key}: {cleanup}");
                }
                Err(e.into())
            }
        }
    }

    async fn get(&self, user_id: &str) -> Result<Option<ResumeAnalysisRow>, AppError> {
        let sql = format!("SELECT {RESUME_COLUMNS} FROM resume_analysis WHERE user_id = $1");
        Ok(sqlx::query_as::<_, ResumeAnalysisRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
