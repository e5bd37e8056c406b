//! Clinidocs CLI
//!
//! Main entry point for the clinidocs command-line tool.
//! A clinical-document assistant: ingest documents into hosted
//! file-search stores and query them with retrieval-augmented generation.

mod commands;

use clap::{Parser, Subcommand};
use clinidocs_core::{config::AppConfig, logging, AppResult};
use commands::{IngestCommand, QueryCommand, StatusCommand, StoresCommand};
use std::path::PathBuf;

/// Clinidocs CLI - document ingestion and grounded clinical queries
#[derive(Parser, Debug)]
#[command(name = "clinidocs")]
#[command(about = "Clinical-document assistant over hosted file-search stores", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "CLINIDOCS_CONFIG")]
    config: Option<PathBuf>,

    /// Remote API base URL
    #[arg(long, global = true, env = "CLINIDOCS_BASE_URL")]
    base_url: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "CLINIDOCS_MODEL")]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage remote file-search stores
    Stores(StoresCommand),

    /// Ingest documents into the active store
    Ingest(IngestCommand),

    /// Run a grounded recommendation query
    Query(QueryCommand),

    /// Show session and store status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.config,
        cli.base_url,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Clinidocs CLI starting");
    tracing::debug!("Base URL: {}", config.base_url);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Stores(_) => "stores",
        Commands::Ingest(_) => "ingest",
        Commands::Query(_) => "query",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Stores(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
