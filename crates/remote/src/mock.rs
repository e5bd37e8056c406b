//! In-memory mock of the remote API for testing and offline development.
//!
//! Deterministic and scriptable: store state lives in a mutex, poll
//! responses are served from a queue, and every call is appended to a log
//! so orchestration tests can assert ordering and absence of calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use clinidocs_core::{AppError, AppResult};

use crate::api::{FileSearchApi, MAX_PAGE_SIZE};
use crate::types::{
    DocumentPage, GenerateOutcome, Operation, RemoteDocument, StagedFile, Store, StorePage,
};

#[derive(Default)]
struct MockState {
    stores: Vec<Store>,
    documents: HashMap<String, Vec<RemoteDocument>>,
    /// Operations served by `get_operation`, in order. When empty, a
    /// completed operation is returned.
    poll_queue: VecDeque<Operation>,
    generate: Option<AppResult<GenerateOutcome>>,
    fail_listing: bool,
    fail_create: bool,
    fail_upload: bool,
    upload_counter: u64,
    store_counter: u64,
    calls: Vec<String>,
}

/// Mock provider for testing and development.
///
/// Behaves like a small, well-behaved instance of the hosted service:
/// creates return fresh store names, deletes of unknown stores return
/// `NotFound`, listings paginate at the server maximum.
#[derive(Default)]
pub struct MockFileSearchApi {
    state: Mutex<MockState>,
}

impl MockFileSearchApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the mock with pre-existing stores.
    pub fn with_stores(self, stores: Vec<Store>) -> Self {
        self.state.lock().unwrap().stores = stores;
        self
    }

    /// Seed documents for a store, returned by document listings.
    pub fn with_documents(self, store_name: &str, documents: Vec<RemoteDocument>) -> Self {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(store_name.to_string(), documents);
        self
    }

    /// Script the sequence of operations served by `get_operation`.
    pub fn with_poll_queue(self, operations: Vec<Operation>) -> Self {
        self.state.lock().unwrap().poll_queue = operations.into();
        self
    }

    /// Script the outcome of `generate_content`.
    pub fn with_generate_outcome(self, outcome: GenerateOutcome) -> Self {
        self.state.lock().unwrap().generate = Some(Ok(outcome));
        self
    }

    /// Script a failure for `generate_content`.
    pub fn with_generate_error(self, error: AppError) -> Self {
        self.state.lock().unwrap().generate = Some(Err(error));
        self
    }

    /// Make listings fail, to exercise degrade-to-empty behavior.
    pub fn failing_listings(self) -> Self {
        self.state.lock().unwrap().fail_listing = true;
        self
    }

    /// Make store creation fail.
    pub fn failing_create(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    /// Make uploads fail.
    pub fn failing_upload(self) -> Self {
        self.state.lock().unwrap().fail_upload = true;
        self
    }

    /// Every call recorded so far, e.g. `"upload:notes.pdf"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Store names currently held by the mock.
    pub fn store_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .stores
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }
}

/// Build a minimal store record for seeding the mock.
pub fn mock_store(name: &str, display_name: &str) -> Store {
    Store {
        name: name.to_string(),
        display_name: Some(display_name.to_string()),
        create_time: None,
        update_time: None,
        active_documents_count: None,
        pending_documents_count: None,
        failed_documents_count: None,
        size_bytes: None,
    }
}

#[async_trait::async_trait]
impl FileSearchApi for MockFileSearchApi {
    async fn list_stores_page(&self, page_token: Option<&str>) -> AppResult<StorePage> {
        self.record(format!("list_stores:{}", page_token.unwrap_or("")));

        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(AppError::RemoteOperation("listing disabled".to_string()));
        }

        let offset: usize = page_token.map(|t| t.parse().unwrap_or(0)).unwrap_or(0);
        let page: Vec<Store> = state
            .stores
            .iter()
            .skip(offset)
            .take(MAX_PAGE_SIZE as usize)
            .cloned()
            .collect();

        let next = offset + page.len();
        let next_page_token = if next < state.stores.len() {
            Some(next.to_string())
        } else {
            None
        };

        Ok(StorePage {
            stores: page,
            next_page_token,
        })
    }

    async fn create_store(&self, display_name: &str) -> AppResult<Store> {
        self.record(format!("create_store:{}", display_name));

        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(AppError::RemoteOperation("create disabled".to_string()));
        }

        state.store_counter += 1;
        let store = mock_store(
            &format!("fileSearchStores/mock-{}", state.store_counter),
            display_name,
        );
        state.stores.push(store.clone());
        Ok(store)
    }

    async fn delete_store(&self, name: &str, force: bool) -> AppResult<()> {
        self.record(format!("delete_store:{}:force={}", name, force));

        let mut state = self.state.lock().unwrap();
        let before = state.stores.len();
        state.stores.retain(|s| s.name != name);
        if state.stores.len() == before {
            return Err(AppError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn list_documents_page(
        &self,
        store_name: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> AppResult<DocumentPage> {
        self.record(format!("list_documents:{}", store_name));

        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(AppError::RemoteOperation("listing disabled".to_string()));
        }

        let documents = state.documents.get(store_name).cloned().unwrap_or_default();
        let offset: usize = page_token.map(|t| t.parse().unwrap_or(0)).unwrap_or(0);
        let page: Vec<RemoteDocument> = documents
            .iter()
            .skip(offset)
            .take(page_size.min(MAX_PAGE_SIZE) as usize)
            .cloned()
            .collect();

        let next = offset + page.len();
        let next_page_token = if next < documents.len() {
            Some(next.to_string())
        } else {
            None
        };

        Ok(DocumentPage {
            documents: page,
            next_page_token,
        })
    }

    async fn upload_file(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        _mime_type: &str,
    ) -> AppResult<StagedFile> {
        self.record(format!("upload:{}", display_name));

        let mut state = self.state.lock().unwrap();
        if state.fail_upload {
            return Err(AppError::Transport("upload disabled".to_string()));
        }

        let _ = bytes;
        state.upload_counter += 1;
        let name = format!("files/mock-{}", state.upload_counter);
        Ok(StagedFile {
            uri: format!("https://mock.local/{}", name),
            name,
        })
    }

    async fn import_file(&self, store_name: &str, file_name: &str) -> AppResult<Operation> {
        self.record(format!("import:{}:{}", store_name, file_name));

        Ok(Operation {
            name: Some(format!("operations/import-{}", file_name.replace('/', "-"))),
            done: Some(false),
            response: None,
            error: None,
        })
    }

    async fn get_operation(&self, operation_name: &str) -> AppResult<Operation> {
        self.record(format!("get_operation:{}", operation_name));

        let mut state = self.state.lock().unwrap();
        Ok(state.poll_queue.pop_front().unwrap_or(Operation {
            name: Some(operation_name.to_string()),
            done: Some(true),
            response: None,
            error: None,
        }))
    }

    async fn generate_content(
        &self,
        _model: &str,
        _prompt: &str,
        store_names: &[String],
    ) -> AppResult<GenerateOutcome> {
        self.record(format!("generate:{}", store_names.join(",")));

        let mut state = self.state.lock().unwrap();
        match state.generate.take() {
            Some(result) => result,
            None => Ok(GenerateOutcome::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_create_and_delete() {
        let api = MockFileSearchApi::new();
        let store = api.create_store("Test").await.unwrap();
        assert!(store.name.starts_with("fileSearchStores/mock-"));

        api.delete_store(&store.name, true).await.unwrap();
        let second = api.delete_store(&store.name, true).await;
        assert!(matches!(second, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mock_pagination() {
        let stores = (0..45)
            .map(|i| mock_store(&format!("fileSearchStores/s{}", i), "S"))
            .collect();
        let api = MockFileSearchApi::new().with_stores(stores);

        let first = api.list_stores_page(None).await.unwrap();
        assert_eq!(first.stores.len(), 20);
        let token = first.next_page_token.unwrap();

        let second = api.list_stores_page(Some(&token)).await.unwrap();
        assert_eq!(second.stores.len(), 20);

        let third = api
            .list_stores_page(second.next_page_token.as_deref())
            .await
            .unwrap();
        assert_eq!(third.stores.len(), 5);
        assert!(third.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let api = MockFileSearchApi::new();
        let _ = api.upload_file(vec![1, 2, 3], "notes.pdf", "application/pdf").await;
        assert_eq!(api.calls(), vec!["upload:notes.pdf".to_string()]);
    }
}
