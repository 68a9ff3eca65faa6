mod assessment;
mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::assessment::store::PgAssessmentStore;
use crate::auth::FirebaseTokenVerifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{GeminiClient, GenerativeModel};
use crate::resume::store::{PgResumeStore, S3ObjectStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Skillpath API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize LLM client. A missing key is reported per call, not at startup.
    let model: Option<Arc<dyn GenerativeModel>> = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone(), config.gemini_api_base.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(client) as Arc<dyn GenerativeModel>)
        }
        None => {
            warn!("Gemini API key is not configured; analyzeSkills will fail with failed-precondition");
            None
        }
    };

    // Initialize token verification
    let verifier = Arc::new(FirebaseTokenVerifier::new(
        config.firebase_project_id.clone(),
    )?);
    verifier.refresh_keys().await?;
    verifier.clone().spawn_refresh();

    // Build app state
    let state = AppState {
        model,
        assessments: Arc::new(PgAssessmentStore::new(db.clone())),
        resumes: Arc::new(PgResumeStore::new(
            db,
            Arc::new(S3ObjectStore::new(s3, config.s3_bucket.clone())),
        )),
        verifier,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the deployed web client

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
/// Path-style addressing keeps bucket names out of the MinIO hostname.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "skillpath-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
