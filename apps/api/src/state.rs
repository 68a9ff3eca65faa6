use std::sync::Arc;

use crate::assessment::store::AssessmentStore;
use crate::auth::TokenVerifier;
use crate::llm_client::GenerativeModel;
use crate::resume::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no Gemini credential was resolved at startup; the
    /// assessment endpoint then fails with `failed-precondition`.
    pub model: Option<Arc<dyn GenerativeModel>>,
    pub assessments: Arc<dyn AssessmentStore>,
    pub resumes: Arc<dyn ResumeStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}
