//! Remote API abstraction.
//!
//! This trait covers the exact REST surface the application consumes:
//! store CRUD and listing, file staging and import, operation polling,
//! and grounded generation. The HTTP implementation lives in
//! [`crate::http`], a deterministic in-memory one in [`crate::mock`].

use clinidocs_core::AppResult;

use crate::types::{DocumentPage, GenerateOutcome, Operation, StagedFile, Store, StorePage};

/// Server-enforced maximum page size for store and document listings.
pub const MAX_PAGE_SIZE: u32 = 20;

/// Low-level access to the hosted file-search and generation service.
///
/// Implementations translate failures into the typed error taxonomy
/// (`Transport`, `NotFound`, `CredentialInvalid`, `RemoteOperation`) so
/// callers never inspect error strings.
#[async_trait::async_trait]
pub trait FileSearchApi: Send + Sync {
    /// Fetch one page of stores visible to the caller's credentials.
    async fn list_stores_page(&self, page_token: Option<&str>) -> AppResult<StorePage>;

    /// Create a store with the given display name.
    async fn create_store(&self, display_name: &str) -> AppResult<Store>;

    /// Delete a store by name. `force` removes it even when it still
    /// contains documents.
    async fn delete_store(&self, name: &str, force: bool) -> AppResult<()>;

    /// Fetch one page of documents within a store.
    async fn list_documents_page(
        &self,
        store_name: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> AppResult<DocumentPage>;

    /// Upload raw bytes to the remote staging area.
    async fn upload_file(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        mime_type: &str,
    ) -> AppResult<StagedFile>;

    /// Request import of a staged file into a store. Returns the handle of
    /// the asynchronous import operation.
    async fn import_file(&self, store_name: &str, file_name: &str) -> AppResult<Operation>;

    /// Fetch the current status of an operation by its handle name.
    async fn get_operation(&self, operation_name: &str) -> AppResult<Operation>;

    /// Generate content with the file-search tool scoped to `store_names`.
    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        store_names: &[String],
    ) -> AppResult<GenerateOutcome>;
}
