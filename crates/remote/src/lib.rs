//! Remote clients for the hosted file-search and generation service.
//!
//! Three thin orchestration layers over one API surface: store lifecycle
//! ([`stores::StoreClient`]), the upload → import → poll ingestion workflow
//! ([`ingest::IngestClient`]), and grounded recommendation queries
//! ([`query::QueryClient`]). All state lives remotely; these clients hold
//! nothing but a handle to the API.

pub mod api;
pub mod http;
pub mod ingest;
pub mod mock;
pub mod query;
pub mod stores;
pub mod types;

pub use api::FileSearchApi;
pub use http::GenAiHttpApi;
pub use ingest::{CancelToken, Canceller, FileUpload, IngestClient};
pub use query::QueryClient;
pub use stores::StoreClient;
pub use types::{DocumentState, Recommendation, RemoteDocument, StagedFile, Store};
