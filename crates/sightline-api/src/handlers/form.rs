//! Multipart form helpers.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::{ApiError, ApiResult};

/// Text fields of a multipart form.
#[derive(Debug, Default)]
pub struct FormFields {
    fields: HashMap<String, String>,
}

impl FormFields {
    pub fn insert(&mut self, name: impl Into<String>, value: String) {
        self.fields.insert(name.into(), value);
    }

    /// Field value, or empty when absent.
    pub fn take(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }

    /// Field value, or `default` when absent or blank.
    pub fn take_or(&mut self, name: &str, default: &str) -> String {
        match self.fields.remove(name) {
            Some(v) if !v.trim().is_empty() => v,
            _ => default.to_string(),
        }
    }

    /// Field value that must be present and non-blank.
    pub fn require(&mut self, name: &str) -> ApiResult<String> {
        match self.fields.remove(name) {
            Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(ApiError::bad_request(format!("Missing form field: {name}"))),
        }
    }
}

/// A file part written to disk.
#[derive(Debug, Clone)]
pub struct SavedFile {
    /// Client-side name, sanitized
    pub original_name: String,
    pub size: u64,
}

/// Stream a file part to `dest`. Returns the bytes written.
pub async fn save_field(mut field: Field<'_>, dest: &Path) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}

/// Remove a stored upload, tolerating files that are already gone.
pub async fn remove_upload(path: &Path) -> ApiResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Stored file already missing");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reduce a client file name to a safe single path component.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
