pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::assessment::handlers as assessment;
use crate::resume::handlers as resume;
use crate::resume::upload::MAX_RESUME_BYTES;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Assessment API
        .route(
            "/api/v1/analyzeSkills",
            post(assessment::handle_analyze_skills),
        )
        .route(
            "/api/v1/assessments/me",
            get(assessment::handle_get_assessment),
        )
        // Resume API
        .route(
            "/api/v1/resumes",
            post(resume::handle_upload_resume).layer(DefaultBodyLimit::max(MAX_RESUME_BYTES)),
        )
        .route("/api/v1/resumes/me", get(resume::handle_get_resume_analysis))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::assessment::generator::testing::ScriptedModel;
    use crate::assessment::store::memory::InMemoryAssessmentStore;
    use crate::assessment::store::AssessmentStore;
    use crate::auth::{AuthError, CallerIdentity, TokenVerifier};
    use crate::llm_client::GenerativeModel;
    use crate::resume::store::memory::InMemoryResumeStore;

    const TOKEN: &str = "valid-token";
    const BOUNDARY: &str = "X-SKILLPATH-BOUNDARY";

    /// Accepts exactly one token and maps it to a fixed uid.
    struct StaticVerifier;

    #[async_trait]
    impl TokenVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
            if token == TOKEN {
                Ok(CallerIdentity {
                    uid: "uid-1".to_string(),
                    email: None,
                })
            } else {
                Err(AuthError::Verification("unknown token".to_string()))
            }
        }
    }

    struct Harness {
        router: Router,
        assessments: Arc<InMemoryAssessmentStore>,
        resumes: Arc<InMemoryResumeStore>,
    }

    fn harness(model: Option<ScriptedModel>) -> Harness {
        let assessments = Arc::new(InMemoryAssessmentStore::default());
        let resumes = Arc::new(InMemoryResumeStore::default());
        let state = AppState {
            model: model.map(|m| Arc::new(m) as Arc<dyn GenerativeModel>),
            assessments: assessments.clone(),
            resumes: resumes.clone(),
            verifier: Arc::new(StaticVerifier),
        };
        Harness {
            router: build_router(state),
            assessments,
            resumes,
        }
    }

    fn analyze_request(token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/analyzeSkills")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn upload_request(token: Option<&str>, file_name: &str, contents: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/resumes")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    const ANSWERS: &str = r#"{"answers": {"frontend": 3, "backend": 2, "dsa": 1, "databases": 0, "devops": 2, "systemDesign": 1}}"#;

    const REPLY: &str = r#"```json
{"score": 64, "detectedSkills": ["React"], "missingSkills": ["Kubernetes"], "strengthAreas": ["Frontend"], "shortSummary": "Nice work."}
```"#;

    #[tokio::test]
    async fn test_health() {
        let h = harness(None);
        let (status, body) = send(&h.router, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_without_token_is_unauthenticated() {
        let h = harness(Some(ScriptedModel::text(REPLY)));
        let (status, body) = send(&h.router, analyze_request(None, ANSWERS)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthenticated");
        assert_eq!(h.assessments.writes(), 0);
    }

    #[tokio::test]
    async fn test_analyze_with_bad_token_and_bad_body_is_unauthenticated() {
        let h = harness(Some(ScriptedModel::text(REPLY)));
        let (status, body) = send(&h.router, analyze_request(Some("forged"), "not json")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_analyze_returns_normalized_assessment() {
        let h = harness(Some(ScriptedModel::text(REPLY)));
        let (status, body) = send(&h.router, analyze_request(Some(TOKEN), ANSWERS)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 64);
        assert_eq!(body["detectedSkills"], json!(["React"]));
        assert_eq!(body["summary"], "Nice work.");
        assert_eq!(body["answers"]["systemDesign"], 1);
        assert!(body.get("createdAt").is_none());

        let stored = h.assessments.get("uid-1").await.unwrap().unwrap();
        assert_eq!(stored.score, 64);
    }

    #[tokio::test]
    async fn test_analyze_rejects_non_json_body() {
        let h = harness(Some(ScriptedModel::text(REPLY)));
        let (status, body) = send(&h.router, analyze_request(Some(TOKEN), "answers=3")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn test_analyze_rejects_missing_field() {
        let h = harness(Some(ScriptedModel::text(REPLY)));
        let body = r#"{"answers": {"frontend": 3, "dsa": 1, "databases": 0, "devops": 2, "systemDesign": 1}}"#;
        let (status, body) = send(&h.router, analyze_request(Some(TOKEN), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn test_analyze_without_credential_is_failed_precondition() {
        let h = harness(None);
        let (status, body) = send(&h.router, analyze_request(Some(TOKEN), ANSWERS)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "failed-precondition");
    }

    #[tokio::test]
    async fn test_analyze_non_json_reply_is_internal() {
        let h = harness(Some(ScriptedModel::text("I'd rather not.")));
        let (status, body) = send(&h.router, analyze_request(Some(TOKEN), ANSWERS)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal");
        assert!(!body["error"]["message"].as_str().unwrap().contains("rather"));
        assert_eq!(h.assessments.writes(), 0);
    }

    #[tokio::test]
    async fn test_get_assessment_before_and_after_submission() {
        let h = harness(Some(ScriptedModel::text(REPLY)));

        let (status, body) = send(&h.router, get_request("/api/v1/assessments/me", Some(TOKEN))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not-found");

        send(&h.router, analyze_request(Some(TOKEN), ANSWERS)).await;

        let (status, body) = send(&h.router, get_request("/api/v1/assessments/me", Some(TOKEN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 64);
        assert_eq!(body["missingSkills"], json!(["Kubernetes"]));
        assert!(body.get("createdAt").is_some());
        assert!(body.get("userId").is_none());
    }

    #[tokio::test]
    async fn test_get_assessment_requires_token() {
        let h = harness(None);
        let (status, _) = send(&h.router, get_request("/api/v1/assessments/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_resume_upload_writes_placeholder() {
        let h = harness(None);
        let (status, body) = send(
            &h.router,
            upload_request(Some(TOKEN), "resume.pdf", b"%PDF-1.7 fake resume"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasResume"], true);
        assert_eq!(body["fileName"], "resume.pdf");
        assert_eq!(body["score"], 0);
        assert_eq!(body["detectedSkills"], json!([]));
        assert_eq!(body["missingSkills"], json!([]));

        let key = body["objectKey"].as_str().unwrap();
        assert!(key.starts_with("resumes/uid-1/"));
        assert_eq!(
            h.resumes.object(key).unwrap().as_ref(),
            b"%PDF-1.7 fake resume"
        );

        let (status, body) = send(&h.router, get_request("/api/v1/resumes/me", Some(TOKEN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fileName"], "resume.pdf");
    }

    #[tokio::test]
    async fn test_resume_upload_rejects_unsupported_type() {
        let h = harness(None);
        let (status, body) =
            send(&h.router, upload_request(Some(TOKEN), "photo.png", b"\x89PNG")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn test_resume_upload_requires_token() {
        let h = harness(None);
        let (status, body) =
            send(&h.router, upload_request(None, "resume.pdf", b"%PDF")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_resume_analysis_missing_is_not_found() {
        let h = harness(None);
        let (status, body) = send(&h.router, get_request("/api/v1/resumes/me", Some(TOKEN))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not-found");
    }
}
