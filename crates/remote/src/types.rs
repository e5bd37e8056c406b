//! Data model shared by the remote clients.
//!
//! Wire types mirror the hosted file-search API. Int64 counters arrive as
//! JSON strings, so those fields deserialize leniently from either form.

use serde::{Deserialize, Deserializer, Serialize};

/// A remote-hosted named container of ingested documents.
///
/// Locally this is only a cached view: counts and sizes are authoritative
/// as of the last list call, and staleness is expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    /// Opaque path-like name assigned by the service, e.g. `fileSearchStores/xyz-123`
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub create_time: Option<String>,

    #[serde(default)]
    pub update_time: Option<String>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub active_documents_count: Option<u64>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub pending_documents_count: Option<u64>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub failed_documents_count: Option<u64>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub size_bytes: Option<u64>,
}

impl Store {
    /// Display name with the service's untitled fallback.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or("(Untitled Store)")
    }
}

/// Lifecycle state of a document inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DocumentState {
    #[serde(rename = "STATE_UNSPECIFIED")]
    #[default]
    Unspecified,

    #[serde(rename = "STATE_PENDING")]
    Pending,

    #[serde(rename = "STATE_ACTIVE")]
    Active,

    #[serde(rename = "STATE_FAILED")]
    Failed,
}

/// A document as the remote store reports it.
///
/// Fetched lazily when a store's detail view is expanded; never kept fresh
/// automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    /// e.g. `fileSearchStores/{store}/documents/{doc}`
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub state: DocumentState,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub size_bytes: Option<u64>,

    #[serde(default)]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub create_time: Option<String>,

    #[serde(default)]
    pub update_time: Option<String>,

    #[serde(default)]
    pub custom_metadata: Option<Vec<CustomMetadata>>,
}

/// Key/value metadata attached to a remote document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMetadata {
    pub key: String,

    #[serde(default)]
    pub string_value: Option<String>,

    #[serde(default)]
    pub numeric_value: Option<f64>,
}

/// A file uploaded to the remote staging area, before import into a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedFile {
    /// Resource identifier, e.g. `files/abc-123`
    pub name: String,

    /// Content URI for the staged bytes
    pub uri: String,
}

/// Handle for an asynchronous remote operation (file import).
///
/// The API is inconsistent about its terminal signal: some responses set
/// `done`, some only attach a `response` or `error` payload. All three are
/// checked on every poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub done: Option<bool>,

    #[serde(default)]
    pub response: Option<serde_json::Value>,

    #[serde(default)]
    pub error: Option<OperationError>,
}

impl Operation {
    /// Whether the operation has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.done == Some(true) || self.response.is_some() || self.error.is_some()
    }
}

/// Error payload carried by a failed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,

    #[serde(default)]
    pub message: Option<String>,
}

/// One ranked, scored answer unit returned for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Display order; positive, ascending
    pub rank: i64,

    pub title: String,

    /// Relevance score in [0, 100]
    pub relevance_score: i64,

    pub summary: String,

    pub actionable_step: String,

    /// Name of the source document the finding came from
    pub source_document: String,
}

/// One page of a store listing.
#[derive(Debug, Clone, Default)]
pub struct StorePage {
    pub stores: Vec<Store>,
    pub next_page_token: Option<String>,
}

/// One page of a document listing within a store.
#[derive(Debug, Clone, Default)]
pub struct DocumentPage {
    pub documents: Vec<RemoteDocument>,
    pub next_page_token: Option<String>,
}

/// Transport-level result of a generation call, before recommendation parsing.
#[derive(Debug, Clone, Default)]
pub struct GenerateOutcome {
    /// Concatenated model text, empty when the model produced none
    pub text: String,

    /// Number of retrieval chunks the model cited as grounding evidence
    pub grounding_chunk_count: usize,
}

/// Deserialize an optional u64 that the API may encode as a JSON string.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => Ok(Some(n)),
        Some(StringOrNumber::String(s)) => Ok(s.parse().ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_counts_from_strings() {
        let json = r#"{
            "name": "fileSearchStores/abc",
            "displayName": "Protocols",
            "activeDocumentsCount": "12",
            "sizeBytes": "1048576"
        }"#;

        let store: Store = serde_json::from_str(json).unwrap();
        assert_eq!(store.active_documents_count, Some(12));
        assert_eq!(store.size_bytes, Some(1_048_576));
        assert_eq!(store.title(), "Protocols");
    }

    #[test]
    fn test_store_untitled_fallback() {
        let store: Store = serde_json::from_str(r#"{"name": "fileSearchStores/x"}"#).unwrap();
        assert_eq!(store.title(), "(Untitled Store)");
    }

    #[test]
    fn test_document_state_wire_names() {
        let doc: RemoteDocument = serde_json::from_str(
            r#"{"name": "fileSearchStores/x/documents/y", "state": "STATE_ACTIVE"}"#,
        )
        .unwrap();
        assert_eq!(doc.state, DocumentState::Active);

        // Missing state defaults to unspecified
        let doc: RemoteDocument =
            serde_json::from_str(r#"{"name": "fileSearchStores/x/documents/z"}"#).unwrap();
        assert_eq!(doc.state, DocumentState::Unspecified);
    }

    #[test]
    fn test_operation_terminal_signals() {
        assert!(!Operation::default().is_terminal());

        let done = Operation {
            done: Some(true),
            ..Default::default()
        };
        assert!(done.is_terminal());

        let with_response = Operation {
            response: Some(serde_json::json!({})),
            ..Default::default()
        };
        assert!(with_response.is_terminal());

        let with_error = Operation {
            error: Some(OperationError {
                code: Some(13),
                message: Some("boom".to_string()),
            }),
            ..Default::default()
        };
        assert!(with_error.is_terminal());
    }
}
