//! Caller identity: verifies the Firebase ID token attached to each request.
//!
//! Handlers never see tokens: they take a `CallerIdentity` (or
//! `Option<CallerIdentity>` where the absence must be reported by the
//! handler itself) and the extractor resolves it through the
//! `TokenVerifier` held in `AppState`.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::state::AppState;

const FIREBASE_CERTS_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";
const KEY_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);
const CERTS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The authenticated user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerIdentity {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization token required")]
    MissingToken,

    #[error("Invalid authorization header format")]
    InvalidHeader,

    #[error("Token verification failed: {0}")]
    Verification(String),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
}

/// Verifies Firebase ID tokens (RS256) against Google's published certificates.
pub struct FirebaseTokenVerifier {
    project_id: String,
    certs_url: String,
    http: reqwest::Client,
    keys: RwLock<HashMap<String, String>>, // kid -> PEM certificate
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: String) -> Result<Self> {
        Self::with_certs_url(project_id, FIREBASE_CERTS_URL, CERTS_FETCH_TIMEOUT)
    }

    /// Verifier that loads certificates from `certs_url`; each fetch is
    /// bounded by `timeout` so a stalled request cannot wedge the refresh loop.
    pub fn with_certs_url(
        project_id: String,
        certs_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build certificate HTTP client")?;

        Ok(Self {
            project_id,
            certs_url: certs_url.into(),
            http,
            keys: RwLock::new(HashMap::new()),
        })
    }

    /// Fetches the current certificate set, replacing the cached one.
    pub async fn refresh_keys(&self) -> Result<()> {
        let keys: HashMap<String, String> = self
            .http
            .get(&self.certs_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Updated Firebase public keys ({} certificates)", keys.len());
        *self.keys.write().await = keys;
        Ok(())
    }

    /// Refreshes certificates every hour. A failed refresh keeps the previous set.
    pub fn spawn_refresh(self: std::sync::Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(KEY_REFRESH_INTERVAL);
            interval.tick().await; // first tick fires immediately; startup already fetched
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh_keys().await {
                    warn!("Firebase key refresh failed: {e:#}");
                }
            }
        });
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Verification(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Verification("missing kid in token header".to_string()))?;

        let decoding_key = {
            let keys = self.keys.read().await;
            let pem = keys
                .get(&kid)
                .ok_or_else(|| AuthError::Verification(format!("unknown key id {kid}")))?;
            DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AuthError::Verification(e.to_string()))?
        };

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        let data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::Verification(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::Verification("empty subject".to_string()));
        }

        Ok(CallerIdentity {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidHeader)
}

#[async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = bearer_token(header).map_err(|e| {
            warn!("Rejected request: {e}");
            AppError::Unauthenticated
        })?;

        let identity = state.verifier.verify(token).await.map_err(|e| {
            warn!("Rejected request: {e}");
            AppError::Unauthenticated
        })?;

        debug!(uid = %identity.uid, email = ?identity.email, "Caller authenticated");
        Ok(identity)
    }
}
