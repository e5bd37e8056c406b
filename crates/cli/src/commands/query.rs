//! Query command handler.
//!
//! Runs a grounded recommendation query over the selected stores and
//! prints the ranked results.

use clap::Args;
use clinidocs_core::{config::AppConfig, AppError, AppResult};
use clinidocs_remote::query::normalize_store_name;
use clinidocs_remote::{FileSearchApi, GenAiHttpApi};
use clinidocs_session::{Phase, SessionController};
use std::sync::Arc;

/// Run a grounded recommendation query
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The natural-language query
    pub text: String,

    /// Stores to query (default: the session's selected store)
    #[arg(short, long)]
    pub stores: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let api: Arc<dyn FileSearchApi> = Arc::new(GenAiHttpApi::new(config.clone()));
        let mut controller = SessionController::new(api, config.clone());

        controller.start().await;
        if let Phase::WelcomeError(message) = controller.phase() {
            return Err(AppError::Other(message.clone()));
        }

        if !self.stores.is_empty() {
            let normalized = self
                .stores
                .iter()
                .map(|s| normalize_store_name(s))
                .collect();
            controller.select_stores_for_query(normalized);
        }

        let recommendations = controller.run_query(&self.text).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&recommendations)?);
            return Ok(());
        }

        if recommendations.is_empty() {
            println!("No grounded recommendations found for this query.");
            return Ok(());
        }

        for rec in &recommendations {
            println!("{}. {} (relevance {})", rec.rank, rec.title, rec.relevance_score);
            println!("   {}", rec.summary);
            println!("   Next step: {}", rec.actionable_step);
            println!("   Source: {}", rec.source_document);
            println!();
        }

        Ok(())
    }
}
