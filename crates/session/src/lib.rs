//! Session state for the clinidocs CLI.
//!
//! Holds the in-memory application state — connection phase, document
//! list, store selection — and the controller that mutates it by
//! orchestrating the remote clients. Nothing here is persisted; the
//! session is gone when the process exits.

pub mod controller;
pub mod documents;

pub use controller::{CredentialPrompt, Phase, SessionController, View};
pub use documents::{DocStatus, Document};
