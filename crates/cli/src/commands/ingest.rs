//! Ingest command handler.
//!
//! Reads local files, validates them, and runs the sequential
//! upload → import → poll workflow against the active store.
//! Ctrl-C cancels the in-flight ingestion via the cancellation token.

use clap::Args;
use clinidocs_core::{config::AppConfig, AppError, AppResult};
use clinidocs_remote::query::normalize_store_name;
use clinidocs_remote::{CancelToken, FileSearchApi, FileUpload, GenAiHttpApi};
use clinidocs_session::{DocStatus, Phase, SessionController};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ingest documents into the active store
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files to ingest (.pdf, .txt, .md; max 10 MiB each)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target store name or identifier (default: the session's active store)
    #[arg(short, long)]
    pub store: Option<String>,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let api: Arc<dyn FileSearchApi> = Arc::new(GenAiHttpApi::new(config.clone()));
        let mut controller = SessionController::new(api, config.clone());

        controller.start().await;
        if let Phase::WelcomeError(message) = controller.phase() {
            return Err(AppError::Other(message.clone()));
        }

        if let Some(store) = &self.store {
            controller.switch_store(normalize_store_name(store));
        }

        let mut uploads = Vec::with_capacity(self.files.len());
        for path in &self.files {
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| AppError::Config(format!("Not a file: {:?}", path)))?;
            let mime_type = guess_media_type(path).to_string();

            uploads.push(FileUpload {
                file_name,
                mime_type,
                bytes,
            });
        }

        // Ctrl-C aborts the in-flight workflow instead of killing the process
        let (canceller, cancel) = CancelToken::pair();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Cancellation requested");
                canceller.cancel();
            }
        });

        let ids = controller.ingest_files(uploads, &cancel).await?;

        let mut failures = 0usize;
        for id in &ids {
            if let Some(doc) = controller.documents().iter().find(|d| &d.id == id) {
                match doc.status {
                    DocStatus::Ready => println!(
                        "ready  {}  {}",
                        doc.name,
                        doc.resource_name.as_deref().unwrap_or("")
                    ),
                    DocStatus::Error => {
                        failures += 1;
                        println!("error  {}", doc.name);
                    }
                    DocStatus::Uploading => println!("pending  {}", doc.name),
                }
            }
        }

        if failures > 0 {
            return Err(AppError::Ingestion(format!(
                "{} of {} file(s) failed",
                failures,
                ids.len()
            )));
        }

        Ok(())
    }
}

/// Map a filename extension to the declared media type, empty when unknown.
fn guess_media_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        _ => "",
    }
}
