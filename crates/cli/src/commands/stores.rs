//! Store management commands.
//!
//! List, create, and delete remote file-search stores, and inspect the
//! documents a store holds.

use clap::{Args, Subcommand};
use clinidocs_core::{config::AppConfig, AppResult};
use clinidocs_remote::query::normalize_store_name;
use clinidocs_remote::{FileSearchApi, GenAiHttpApi, StoreClient};
use std::sync::Arc;

/// Manage remote file-search stores
#[derive(Args, Debug)]
pub struct StoresCommand {
    #[command(subcommand)]
    action: StoresAction,
}

#[derive(Subcommand, Debug)]
enum StoresAction {
    /// List all stores visible to the configured credentials
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new store
    Create {
        /// Display name (default: a dated session name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete one or more stores (force-deletes documents too)
    Delete {
        /// Store names or identifiers
        names: Vec<String>,
    },

    /// List the documents within a store
    Docs {
        /// Store name or identifier
        store: String,

        /// Page size (max 20, default 10)
        #[arg(long)]
        page_size: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl StoresCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let api: Arc<dyn FileSearchApi> = Arc::new(GenAiHttpApi::new(config.clone()));
        let client = StoreClient::new(api);

        match &self.action {
            StoresAction::List { json } => {
                let stores = client.list_stores().await;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&stores)?);
                    return Ok(());
                }

                if stores.is_empty() {
                    println!("No stores found.");
                    return Ok(());
                }

                for store in &stores {
                    println!("{}  {}", store.name, store.title());
                    println!(
                        "    documents: {} active, {} pending, {} failed; {} bytes",
                        store.active_documents_count.unwrap_or(0),
                        store.pending_documents_count.unwrap_or(0),
                        store.failed_documents_count.unwrap_or(0),
                        store.size_bytes.unwrap_or(0),
                    );
                }
                Ok(())
            }

            StoresAction::Create { name } => {
                let store = client.create_store(name.as_deref()).await?;
                println!("Created {}  {}", store.name, store.title());
                Ok(())
            }

            StoresAction::Delete { names } => {
                for name in names {
                    let name = normalize_store_name(name);
                    client.delete_store(&name).await?;
                    println!("Deleted {}", name);
                }
                Ok(())
            }

            StoresAction::Docs {
                store,
                page_size,
                json,
            } => {
                let store = normalize_store_name(store);
                let documents = client.list_documents(&store, *page_size).await;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&documents)?);
                    return Ok(());
                }

                if documents.is_empty() {
                    println!("No documents in {}.", store);
                    return Ok(());
                }

                for doc in &documents {
                    println!(
                        "{}  {:?}  {}",
                        doc.display_name.as_deref().unwrap_or(&doc.name),
                        doc.state,
                        doc.size_bytes
                            .map(|b| format!("{} bytes", b))
                            .unwrap_or_default(),
                    );
                }
                Ok(())
            }
        }
    }
}
