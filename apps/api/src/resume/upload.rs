use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Upload size ceiling for the resume route, in bytes.
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

/// A validated resume file, ready to be stored.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ResumeUpload {
    /// Validates the uploaded part: it needs a file name with an allowed
    /// extension and a non-empty body.
    pub fn new(
        file_name: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<Self, AppError> {
        let file_name = sanitize_file_name(file_name);
        if file_name.is_empty() {
            return Err(AppError::InvalidArgument(
                "Please select a resume file to upload.".into(),
            ));
        }

        let extension = extension_of(&file_name).ok_or_else(|| unsupported(&file_name))?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(unsupported(&file_name));
        }

        if bytes.is_empty() {
            return Err(AppError::InvalidArgument(format!("{file_name} is empty.")));
        }

        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_content_type(&extension).to_string());

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Object key for this upload. Each upload gets a fresh key so earlier
    /// files are never overwritten in place.
    pub fn object_key(&self, user_id: &str) -> String {
        format!("resumes/{}/{}/{}", user_id, Uuid::new_v4(), self.file_name)
    }
}

fn unsupported(file_name: &str) -> AppError {
    AppError::InvalidArgument(format!(
        "Unsupported resume file '{file_name}'. Upload a PDF, DOC or DOCX."
    ))
}

fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

fn default_content_type(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Keeps the last path segment and replaces anything outside `[A-Za-z0-9._-]` with `_`.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
