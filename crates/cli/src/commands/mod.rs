//! Command handlers for the clinidocs CLI.

mod ingest;
mod query;
mod status;
mod stores;

pub use ingest::IngestCommand;
pub use query::QueryCommand;
pub use status::StatusCommand;
pub use stores::StoresCommand;
