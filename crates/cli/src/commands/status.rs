//! Status command handler.
//!
//! Shows the session's connection phase, the active/selected stores, and
//! the cached store listing.

use clap::Args;
use clinidocs_core::{config::AppConfig, AppResult};
use clinidocs_remote::{FileSearchApi, GenAiHttpApi};
use clinidocs_session::{Phase, SessionController};
use std::sync::Arc;

/// Show session and store status
#[derive(Args, Debug)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let api: Arc<dyn FileSearchApi> = Arc::new(GenAiHttpApi::new(config.clone()));
        let mut controller = SessionController::new(api, config.clone());

        controller.start().await;

        match controller.phase() {
            Phase::WelcomeError(message) => {
                println!("Not connected: {}", message);
                return Ok(());
            }
            Phase::Ready => println!("Connected."),
            Phase::CheckingCredentials => println!("Checking credentials..."),
        }

        match controller.active_store() {
            Some(active) => println!("Active store: {}", active),
            None => println!("Active store: none (create one with `clinidocs stores create`)"),
        }

        if controller.stores().is_empty() {
            println!("No stores visible.");
            return Ok(());
        }

        println!("Stores:");
        for store in controller.stores() {
            let selected = controller
                .selected_stores()
                .iter()
                .any(|s| s == &store.name);
            println!(
                "  {} {}  {}  ({} active, {} pending, {} failed)",
                if selected { "*" } else { " " },
                store.name,
                store.title(),
                store.active_documents_count.unwrap_or(0),
                store.pending_documents_count.unwrap_or(0),
                store.failed_documents_count.unwrap_or(0),
            );
        }

        Ok(())
    }
}
