//! Remote ingestion client.
//!
//! Wraps the three-step remote workflow that makes a file searchable:
//! upload raw bytes to the staging area, request import into a store, and
//! poll the resulting operation until terminal.
//!
//! Polling is bounded: a fixed interval between attempts and a maximum
//! attempt count, with a cancellation token checked at every suspension
//! point. An import that never completes surfaces as `IngestionTimedOut`
//! instead of stalling the document forever.

use std::sync::Arc;
use std::time::Duration;

use clinidocs_core::{AppError, AppResult};
use tokio::sync::watch;

use crate::api::FileSearchApi;
use crate::types::StagedFile;

/// Media type assumed when the caller supplies none.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// A file selected for ingestion: name, declared media type, raw bytes.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    /// Declared media type; may be empty when the source cannot tell
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Cancellation signal threaded from the caller into long-running work.
///
/// Cloneable observer half of a watch channel; the [`Canceller`] flips it.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// The triggering half of a cancellation pair.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancelToken {
    /// Create a linked canceller/token pair.
    pub fn pair() -> (Canceller, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Canceller { tx }, CancelToken { rx })
    }

    /// A token that can never be cancelled.
    pub fn never() -> Self {
        static NEVER: std::sync::OnceLock<watch::Sender<bool>> = std::sync::OnceLock::new();
        let tx = NEVER.get_or_init(|| watch::channel(false).0);
        CancelToken { rx: tx.subscribe() }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested. Pends forever if the
    /// canceller is dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

/// Client for the upload → import → poll ingestion workflow.
#[derive(Clone)]
pub struct IngestClient {
    api: Arc<dyn FileSearchApi>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl IngestClient {
    pub fn new(api: Arc<dyn FileSearchApi>, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        Self {
            api,
            poll_interval,
            max_poll_attempts,
        }
    }

    /// Ingest one file into the target store.
    ///
    /// The steps are strictly ordered and not interruptible mid-step; the
    /// cancellation token is honored between steps and during poll sleeps.
    /// On success, returns the staged resource identifier and content URI.
    pub async fn ingest(
        &self,
        upload: &FileUpload,
        store_name: &str,
        cancel: &CancelToken,
    ) -> AppResult<StagedFile> {
        if cancel.is_cancelled() {
            return Err(AppError::IngestionCancelled);
        }

        let mime_type = if upload.mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            &upload.mime_type
        };

        tracing::info!("Starting upload for {}", upload.file_name);

        // 1. Upload raw bytes to the staging area
        let staged = self
            .api
            .upload_file(upload.bytes.clone(), &upload.file_name, mime_type)
            .await
            .map_err(|e| AppError::Ingestion(format!("upload failed: {}", e)))?;

        tracing::info!(
            "File uploaded as {}. Importing into store {}",
            staged.name,
            store_name
        );

        if cancel.is_cancelled() {
            return Err(AppError::IngestionCancelled);
        }

        // 2. Request import into the store
        let mut operation = self
            .api
            .import_file(store_name, &staged.name)
            .await
            .map_err(|e| AppError::Ingestion(format!("import failed: {}", e)))?;

        // 3. Poll the operation handle until terminal
        let mut attempts: u32 = 0;
        while !operation.is_terminal() {
            if attempts >= self.max_poll_attempts {
                tracing::error!(
                    "Import of {} still pending after {} poll attempts",
                    upload.file_name,
                    attempts
                );
                return Err(AppError::IngestionTimedOut { attempts });
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => return Err(AppError::IngestionCancelled),
            }

            let handle = operation
                .name
                .as_deref()
                .ok_or_else(|| AppError::Ingestion("operation handle has no name".to_string()))?;

            operation = self
                .api
                .get_operation(handle)
                .await
                .map_err(|e| AppError::Ingestion(format!("poll failed: {}", e)))?;

            attempts += 1;
        }

        // A terminal error payload fails the whole ingest
        if let Some(error) = operation.error {
            let message = error.message.unwrap_or_else(|| "unknown".to_string());
            return Err(AppError::Ingestion(format!(
                "import failed: {} (code {})",
                message,
                error.code.unwrap_or(0)
            )));
        }

        tracing::info!("Document ready: {}", staged.name);
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFileSearchApi;
    use crate::types::{Operation, OperationError};

    fn upload() -> FileUpload {
        FileUpload {
            file_name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0u8; 128],
        }
    }

    fn fast_client(api: Arc<MockFileSearchApi>, max_attempts: u32) -> IngestClient {
        IngestClient::new(api, Duration::from_millis(1), max_attempts)
    }

    fn pending_op(n: u32) -> Vec<Operation> {
        (0..n)
            .map(|i| Operation {
                name: Some(format!("operations/pending-{}", i)),
                done: Some(false),
                response: None,
                error: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_ingest_success_after_polls() {
        let api = Arc::new(MockFileSearchApi::new().with_poll_queue(pending_op(2)));
        let client = fast_client(api.clone(), 10);

        let staged = client
            .ingest(&upload(), "fileSearchStores/a", &CancelToken::never())
            .await
            .unwrap();

        assert!(!staged.name.is_empty());
        assert!(!staged.uri.is_empty());

        // upload → import → polls (2 pending + 1 done)
        let calls = api.calls();
        assert_eq!(calls[0], "upload:notes.pdf");
        assert!(calls[1].starts_with("import:fileSearchStores/a"));
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("get_operation")).count(),
            3
        );
    }

    #[tokio::test]
    async fn test_ingest_defaults_empty_mime_type() {
        let api = Arc::new(MockFileSearchApi::new());
        let client = fast_client(api.clone(), 10);

        let mut file = upload();
        file.file_name = "notes.txt".to_string();
        file.mime_type = String::new();

        client
            .ingest(&file, "fileSearchStores/a", &CancelToken::never())
            .await
            .unwrap();
        // The mock does not inspect the mime type; reaching here means the
        // empty declared type did not abort ingestion
    }

    #[tokio::test]
    async fn test_ingest_times_out() {
        // More pending responses than the attempt budget
        let api = Arc::new(MockFileSearchApi::new().with_poll_queue(pending_op(50)));
        let client = fast_client(api, 3);

        let result = client
            .ingest(&upload(), "fileSearchStores/a", &CancelToken::never())
            .await;

        match result {
            Err(AppError::IngestionTimedOut { attempts }) => assert_eq!(attempts, 3),
            other => panic!("Expected IngestionTimedOut, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_ingest_surfaces_operation_error() {
        let api = Arc::new(MockFileSearchApi::new().with_poll_queue(vec![Operation {
            name: Some("operations/failing".to_string()),
            done: Some(true),
            response: None,
            error: Some(OperationError {
                code: Some(13),
                message: Some("unsupported encoding".to_string()),
            }),
        }]));
        let client = fast_client(api, 10);

        let result = client
            .ingest(&upload(), "fileSearchStores/a", &CancelToken::never())
            .await;

        match result {
            Err(AppError::Ingestion(msg)) => assert!(msg.contains("unsupported encoding")),
            other => panic!("Expected Ingestion error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_ingest_upload_failure() {
        let api = Arc::new(MockFileSearchApi::new().failing_upload());
        let client = fast_client(api.clone(), 10);

        let result = client
            .ingest(&upload(), "fileSearchStores/a", &CancelToken::never())
            .await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));

        // Nothing after the failed upload
        assert_eq!(api.calls(), vec!["upload:notes.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_ingest_honors_cancellation() {
        let api = Arc::new(MockFileSearchApi::new().with_poll_queue(pending_op(50)));
        // Long interval so the sleep is where cancellation lands
        let client = IngestClient::new(api, Duration::from_secs(30), 100);

        let (canceller, token) = CancelToken::pair();
        canceller.cancel();

        let file = upload();
        let result = client.ingest(&file, "fileSearchStores/a", &token).await;
        assert!(matches!(result, Err(AppError::IngestionCancelled)));
    }

    #[tokio::test]
    async fn test_cancel_token_never() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());
    }
}
