//! LLM client: the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All LLM interactions MUST go through this module.
//!
//! Model: gemini-1.5-pro (hardcoded, not configurable, to prevent drift)
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-1.5-pro";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A text-in, text-out generative model.
///
/// Carried in `AppState` as `Arc<dyn GenerativeModel>`, so handlers and the
/// assessment pipeline never see the provider wire format.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends a single user prompt and returns the model's text reply.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Wraps the Gemini `generateContent` endpoint.
///
/// One call per prompt, no retries: a failed call is terminal for the
/// request that issued it.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, MODEL)
    }

    /// Makes a raw call to the Gemini API, returning the decoded response body.
    pub async fn call(&self, prompt: &str) -> Result<Value, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API returned {}: {}", status, body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: Value = response.json().await?;
        debug!("Gemini call succeeded");
        Ok(body)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = self.call(prompt).await?;
        match extract_text(&body) {
            Some(text) => Ok(text.to_string()),
            None => {
                error!("Unexpected Gemini response: {body}");
                Err(LlmError::EmptyContent)
            }
        }
    }
}

/// Pulls the reply text out of a `generateContent` response.
///
/// Reads `candidates[0].content.parts[0].text`, falling back to
/// `candidates[0].output`. Empty strings count as absent.
pub fn extract_text(body: &Value) -> Option<&str> {
    non_empty_str(body.pointer("/candidates/0/content/parts/0/text"))
        .or_else(|| non_empty_str(body.pointer("/candidates/0/output")))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Removes every ```json (any case) and ``` marker from LLM output, then trims.
/// Markers are stripped wherever they appear, not only at the ends.
pub fn strip_json_fences(text: &str) -> String {
    const FENCE: &str = "```";
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find(FENCE) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + FENCE.len()..];
        if rest
            .get(..4)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
        {
            rest = &rest[4..];
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

/// Strips fences and parses what is left as JSON.
pub fn parse_json_text(text: &str) -> Result<Value, LlmError> {
    serde_json::from_str(&strip_json_fences(text)).map_err(LlmError::Parse)
}
