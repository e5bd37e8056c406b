//! Core library for the clinidocs CLI.
//!
//! Provides configuration, error handling, and logging used by every
//! other crate in the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{AppError, AppResult};
