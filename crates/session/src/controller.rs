//! Session controller.
//!
//! Owns all in-memory application state — connection phase, current view,
//! the document list, and store selection — and orchestrates the remote
//! clients. State is mutated only through the transition methods here;
//! the presentation layer reads it and dispatches intents back.
//!
//! Selection invariant: the active store (ingestion target) is a member of
//! the selected-stores set (query scope) whenever both exist. The only
//! transitions that could break it re-establish it before returning.

use std::sync::Arc;
use std::time::Duration;

use clinidocs_core::{config::AppConfig, AppError, AppResult};
use clinidocs_remote::{
    CancelToken, FileSearchApi, FileUpload, IngestClient, QueryClient, Recommendation, Store,
    StoreClient,
};

use crate::documents::{validate_upload, DocStatus, Document};

/// Connection phase of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Startup: credential being read and verified
    CheckingCredentials,

    /// Credential read or verification failed; carries the user-facing message
    WelcomeError(String),

    /// Connected; the main views are available
    Ready,
}

/// Active view within the ready phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Ingest,
    Query,
}

/// Optional host-provided hook to prompt interactive credential selection.
///
/// Absence is tolerated: the session works without it, the user just has
/// to set the key in the environment themselves.
#[async_trait::async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn prompt(&self) -> AppResult<()>;
}

/// In-memory session state and the transitions that mutate it.
pub struct SessionController {
    config: AppConfig,
    store_client: StoreClient,
    ingest_client: IngestClient,
    query_client: QueryClient,
    credential_prompt: Option<Box<dyn CredentialPrompt>>,

    phase: Phase,
    view: View,
    documents: Vec<Document>,
    stores: Vec<Store>,
    active_store: Option<String>,
    selected_stores: Vec<String>,
}

impl SessionController {
    pub fn new(api: Arc<dyn FileSearchApi>, config: AppConfig) -> Self {
        let store_client = StoreClient::new(api.clone());
        let ingest_client = IngestClient::new(
            api.clone(),
            Duration::from_secs(config.poll_interval_secs),
            config.max_poll_attempts,
        );
        let query_client = QueryClient::new(api, config.model.clone());

        Self {
            config,
            store_client,
            ingest_client,
            query_client,
            credential_prompt: None,
            phase: Phase::CheckingCredentials,
            view: View::Query,
            documents: Vec::new(),
            stores: Vec::new(),
            active_store: None,
            selected_stores: Vec::new(),
        }
    }

    /// Attach the host's credential-selection hook.
    pub fn with_credential_prompt(mut self, prompt: Box<dyn CredentialPrompt>) -> Self {
        self.credential_prompt = Some(prompt);
        self
    }

    // --- accessors -------------------------------------------------------

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn active_store(&self) -> Option<&str> {
        self.active_store.as_deref()
    }

    pub fn selected_stores(&self) -> &[String] {
        &self.selected_stores
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    // --- connection ------------------------------------------------------

    /// Startup transition: read the credential, then discover stores.
    pub async fn start(&mut self) {
        self.phase = Phase::CheckingCredentials;

        if let Err(e) = self.config.resolve_api_key() {
            tracing::warn!("Credential check failed: {}", e);
            self.phase = Phase::WelcomeError(e.user_message().to_string());
            return;
        }

        self.discover_stores().await;
    }

    /// Manual connect action: let the host prompt for a key, then re-run
    /// the same discovery sequence as [`Self::start`].
    pub async fn connect(&mut self) {
        if let Some(prompt) = &self.credential_prompt {
            if let Err(e) = prompt.prompt().await {
                tracing::warn!("Credential selection failed: {}", e);
                self.phase = Phase::WelcomeError(e.user_message().to_string());
                return;
            }
        }

        self.start().await;
    }

    /// List stores and pick (or create) the session's initial store.
    async fn discover_stores(&mut self) {
        self.stores = self.store_client.list_stores().await;

        if let Some(first) = self.stores.first() {
            let name = first.name.clone();
            tracing::info!("Using existing store {}", name);
            self.active_store = Some(name.clone());
            self.selected_stores = vec![name];
            self.phase = Phase::Ready;
            return;
        }

        // No stores visible: create one for this session
        match self.store_client.create_store(None).await {
            Ok(store) => {
                self.stores = self.store_client.list_stores().await;
                self.active_store = Some(store.name.clone());
                self.selected_stores = vec![store.name];
                self.phase = Phase::Ready;
            }
            Err(e) => {
                // Still usable for store management; ingestion and querying
                // stay unavailable until a store is created manually
                tracing::error!("Failed to create session store: {}", e);
                self.active_store = None;
                self.selected_stores = Vec::new();
                self.phase = Phase::Ready;
            }
        }
    }

    // --- store selection -------------------------------------------------

    /// Make one store both the ingestion target and the sole query scope.
    pub fn switch_store(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.active_store = Some(name.clone());
        self.selected_stores = vec![name];
        self.view = View::Query;
    }

    /// Set the query scope. The active store is re-pointed to the first of
    /// the new set, keeping the selection invariant.
    pub fn select_stores_for_query(&mut self, names: Vec<String>) {
        if let Some(first) = names.first() {
            self.active_store = Some(first.clone());
        }
        self.selected_stores = names;
        self.view = View::Query;
    }

    /// Delete the named stores and reconcile local state.
    ///
    /// Deletes run concurrently; one failure surfaces as one generic error
    /// even if the others succeeded. On success the store list is
    /// refreshed, the active/selected state re-pointed to the first
    /// survivor (or cleared), and — when the active store was among the
    /// deleted — the local document list is cleared.
    pub async fn delete_stores(&mut self, names: &[String]) -> AppResult<()> {
        if names.is_empty() {
            return Ok(());
        }

        let deletes = names.iter().map(|name| self.store_client.delete_store(name));
        let results = futures::future::join_all(deletes).await;
        if results.iter().any(|r| r.is_err()) {
            return Err(AppError::RemoteOperation(
                "Failed to delete one or more stores.".to_string(),
            ));
        }

        self.stores = self.store_client.list_stores().await;

        let active_deleted = self
            .active_store
            .as_ref()
            .map(|active| names.contains(active))
            .unwrap_or(false);

        if active_deleted {
            if let Some(first) = self.stores.first() {
                self.active_store = Some(first.name.clone());
                self.selected_stores = vec![first.name.clone()];
            } else {
                self.active_store = None;
                self.selected_stores = Vec::new();
            }
            self.documents.clear();
        }

        self.selected_stores.retain(|id| !names.contains(id));
        Ok(())
    }

    // --- document list ---------------------------------------------------

    pub fn add_documents(&mut self, docs: Vec<Document>) {
        self.documents.extend(docs);
    }

    /// Remove a document from the session list. Unknown ids are a no-op.
    pub fn remove_document(&mut self, id: &str) {
        self.documents.retain(|d| d.id != id);
    }

    /// Apply a mutation to the document with the given id, if present.
    pub fn update_document(&mut self, id: &str, update: impl FnOnce(&mut Document)) {
        if let Some(doc) = self.documents.iter_mut().find(|d| d.id == id) {
            update(doc);
        }
    }

    // --- ingestion -------------------------------------------------------

    /// Validate and ingest a batch of files into the active store.
    ///
    /// Placeholders for every file appear immediately; ingestion then runs
    /// strictly one file at a time. A failing file marks only its own
    /// document and never blocks its siblings. Returns the placeholder ids
    /// in submission order.
    pub async fn ingest_files(
        &mut self,
        files: Vec<FileUpload>,
        cancel: &CancelToken,
    ) -> AppResult<Vec<String>> {
        let store_name = self
            .active_store
            .clone()
            .ok_or(AppError::NoStoreSelected)?;

        let placeholders: Vec<Document> = files
            .iter()
            .map(|f| Document::placeholder(&f.file_name, &f.mime_type, f.bytes.len() as u64))
            .collect();
        let ids: Vec<String> = placeholders.iter().map(|d| d.id.clone()).collect();
        self.add_documents(placeholders);

        for (file, id) in files.into_iter().zip(ids.iter()) {
            // Rejected files never reach the ingestion client
            if let Err(e) = validate_upload(&file.file_name, &file.mime_type, file.bytes.len() as u64)
            {
                tracing::warn!("Rejected {}: {}", file.file_name, e);
                self.update_document(id, |doc| doc.status = DocStatus::Error);
                continue;
            }

            match self.ingest_client.ingest(&file, &store_name, cancel).await {
                Ok(staged) => {
                    self.update_document(id, |doc| {
                        doc.status = DocStatus::Ready;
                        doc.resource_name = Some(staged.name.clone());
                        doc.uri = Some(staged.uri.clone());
                    });
                }
                Err(e) => {
                    tracing::warn!("Ingestion failed for {}: {}", file.file_name, e);
                    self.update_document(id, |doc| doc.status = DocStatus::Error);
                }
            }
        }

        Ok(ids)
    }

    // --- querying --------------------------------------------------------

    /// Run a recommendation query over the selected stores.
    ///
    /// An empty selection, unusable model output, and transport failures
    /// all surface as an empty result; the distinction lives in the log.
    pub async fn run_query(&self, text: &str) -> AppResult<Vec<Recommendation>> {
        match self.query_client.query(text, &self.selected_stores).await {
            Ok(recommendations) => Ok(recommendations),
            Err(
                e @ (AppError::NoStoreSelected
                | AppError::MalformedModelOutput(_)
                | AppError::Transport(_)),
            ) => {
                tracing::warn!("Query yielded no usable result: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
