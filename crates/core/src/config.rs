//! Configuration management for the clinidocs CLI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - An optional YAML config file
//!
//! The API key is deliberately NOT stored in this struct. It is resolved from
//! the process environment at call time by [`AppConfig::resolve_api_key`], so
//! a rotated key takes effect without restarting the process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default base URL for the hosted file-search and generation API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generation model used for retrieval-augmented queries.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the remote API
    pub base_url: String,

    /// Generation model identifier
    pub model: String,

    /// Environment variable the API key is read from
    pub api_key_env: String,

    /// Seconds between ingestion poll attempts
    pub poll_interval_secs: u64,

    /// Maximum ingestion poll attempts before giving up
    pub max_poll_attempts: u32,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    remote: Option<RemoteConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemoteConfig {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    model: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "pollIntervalSecs")]
    poll_interval_secs: Option<u64>,
    #[serde(rename = "maxPollAttempts")]
    max_poll_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: API_KEY_ENV.to_string(),
            poll_interval_secs: 5,
            max_poll_attempts: 120,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CLINIDOCS_CONFIG`: Path to config file
    /// - `CLINIDOCS_BASE_URL`: Remote API base URL
    /// - `CLINIDOCS_MODEL`: Generation model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("CLINIDOCS_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if one was named
        if let Some(config_path) = config.config_file.clone() {
            if config_path.exists() {
                config = config.merge_yaml(&config_path)?;
            }
        }

        // Environment variables override YAML config
        if let Ok(base_url) = std::env::var("CLINIDOCS_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(model) = std::env::var("CLINIDOCS_MODEL") {
            config.model = model;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(remote) = config_file.remote {
            if let Some(base_url) = remote.base_url {
                result.base_url = base_url;
            }
            if let Some(model) = remote.model {
                result.model = model;
            }
            if let Some(api_key_env) = remote.api_key_env {
                result.api_key_env = api_key_env;
            }
            if let Some(interval) = remote.poll_interval_secs {
                result.poll_interval_secs = interval;
            }
            if let Some(attempts) = remote.max_poll_attempts {
                result.max_poll_attempts = attempts;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        base_url: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the API key from the process environment.
    ///
    /// Re-read on every call so a rotated key is picked up without restart.
    /// Absence is a [`AppError::CredentialMissing`] — the caller decides
    /// whether that blocks the whole session or a single request.
    pub fn resolve_api_key(&self) -> AppResult<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AppError::CredentialMissing),
        }
    }
}
