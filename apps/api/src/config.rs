use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_RUNTIME_CONFIG_PATH: &str = ".runtimeconfig.json";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
///
/// The Gemini key is optional here: a missing key only fails the
/// `analyzeSkills` call, not the whole process.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub firebase_project_id: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let runtime_config_path = std::env::var("RUNTIME_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_RUNTIME_CONFIG_PATH.to_string());

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            firebase_project_id: require_env("FIREBASE_PROJECT_ID")?,
            gemini_api_key: resolve_gemini_key(
                std::env::var("GEMINI_API_KEY").ok(),
                Path::new(&runtime_config_path),
            )?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Shape of the platform runtime config file: `{"gemini": {"key": "..."}}`.
#[derive(Debug, Default, Deserialize)]
struct RuntimeConfig {
    gemini: Option<GeminiSection>,
}

#[derive(Debug, Deserialize)]
struct GeminiSection {
    key: Option<String>,
}

/// Resolves the Gemini credential. The env value wins when non-empty,
/// otherwise the runtime config file is consulted. A missing file means
/// no key; a malformed one is a startup error.
fn resolve_gemini_key(env_value: Option<String>, runtime_config: &Path) -> Result<Option<String>> {
    if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
        return Ok(Some(key));
    }

    if !runtime_config.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(runtime_config)
        .with_context(|| format!("Failed to read runtime config {}", runtime_config.display()))?;
    let parsed: RuntimeConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Runtime config {} is not valid JSON", runtime_config.display()))?;

    Ok(parsed
        .gemini
        .and_then(|g| g.key)
        .filter(|k| !k.trim().is_empty()))
}
