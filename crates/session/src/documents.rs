//! Local, ephemeral document records and upload validation.
//!
//! A [`Document`] exists only for the life of the session: it is created
//! when a file is selected, mutated as ingestion progresses, and lost on
//! exit. The remote store keeps whatever ingestion completed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clinidocs_core::{AppError, AppResult};

/// Maximum accepted upload size.
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Declared media types accepted for ingestion.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["application/pdf", "text/plain", "text/markdown"];

/// Filename extensions accepted when no media type is declared.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = [".pdf", ".txt", ".md"];

/// Lifecycle status of a locally tracked document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    Uploading,
    Ready,
    Error,
}

/// A document the user selected for ingestion this session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Locally generated identifier, unique per session
    pub id: String,

    /// Display name (the selected file's name)
    pub name: String,

    /// Declared media type; may be empty
    pub media_type: String,

    /// Size in bytes
    pub size: u64,

    pub status: DocStatus,

    /// Remote resource identifier once ingestion succeeds, e.g. `files/abc-123`
    pub resource_name: Option<String>,

    /// Content URI once ingestion succeeds
    pub uri: Option<String>,
}

impl Document {
    /// Create a placeholder in the `Uploading` state.
    pub fn placeholder(name: impl Into<String>, media_type: impl Into<String>, size: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            media_type: media_type.into(),
            size,
            status: DocStatus::Uploading,
            resource_name: None,
            uri: None,
        }
    }
}

/// Validate a file before it reaches the ingestion client.
///
/// A non-empty declared type must be one of the accepted media types.
/// An empty declared type falls back to the filename extension. Files
/// over the size limit are rejected regardless of type.
pub fn validate_upload(name: &str, declared_type: &str, size: u64) -> AppResult<()> {
    if size > MAX_FILE_SIZE_BYTES {
        return Err(AppError::Ingestion(format!(
            "{} exceeds the {} MiB size limit",
            name,
            MAX_FILE_SIZE_BYTES / (1024 * 1024)
        )));
    }

    if declared_type.is_empty() {
        let lower = name.to_lowercase();
        if !ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Err(AppError::Ingestion(format!(
                "{} has no recognized extension (accepted: .pdf, .txt, .md)",
                name
            )));
        }
    } else if !ACCEPTED_MIME_TYPES.contains(&declared_type) {
        return Err(AppError::Ingestion(format!(
            "unsupported media type {} for {}",
            declared_type, name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_starts_uploading() {
        let doc = Document::placeholder("notes.pdf", "application/pdf", 2048);
        assert_eq!(doc.status, DocStatus::Uploading);
        assert!(doc.resource_name.is_none());
        assert!(doc.uri.is_none());
        assert!(!doc.id.is_empty());
    }

    #[test]
    fn test_placeholder_ids_unique() {
        let a = Document::placeholder("a.txt", "text/plain", 1);
        let b = Document::placeholder("a.txt", "text/plain", 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_validate_accepted_types() {
        assert!(validate_upload("notes.pdf", "application/pdf", 2048).is_ok());
        assert!(validate_upload("notes.txt", "text/plain", 2048).is_ok());
        assert!(validate_upload("notes.md", "text/markdown", 2048).is_ok());
    }

    #[test]
    fn test_validate_rejects_unsupported_type() {
        assert!(validate_upload("photo.png", "image/png", 2048).is_err());
    }

    #[test]
    fn test_validate_extension_fallback_for_empty_type() {
        assert!(validate_upload("notes.md", "", 2048).is_ok());
        assert!(validate_upload("NOTES.PDF", "", 2048).is_ok());
        assert!(validate_upload("archive.zip", "", 2048).is_err());
    }

    #[test]
    fn test_validate_rejects_oversize() {
        let result = validate_upload("big.pdf", "application/pdf", MAX_FILE_SIZE_BYTES + 1);
        assert!(result.is_err());

        // Exactly at the limit is accepted
        assert!(validate_upload("fits.pdf", "application/pdf", MAX_FILE_SIZE_BYTES).is_ok());
    }
}
