//! Configuration types for the Swot client.
//!
//! Configuration is loaded from `swot.json`; every field has a default so a
//! missing file yields a working configuration pointed at a local service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "swot.json";

/// Default base URL of the remote study service.
fn default_api_base_url() -> String {
    "http://localhost:4000/api".to_string()
}

/// Default timeout in seconds applied to every network call.
const fn default_request_timeout_secs() -> u64 {
    30
}

/// Client configuration.
///
/// Controls where the remote study service lives and how long any single
/// network call may take before it resolves into the `Timeout` error kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the remote study service, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout in seconds for each network call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `swot.json` in the current directory. If found, loads and
    /// validates the configuration. If not found, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            StudyError::validation(format!("cannot determine current directory: {e}"))
        })?;
        Self::load_from_file(&current_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the file exists but contains invalid
    /// JSON, or if the loaded values fail [`Config::validate`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(StudyError::validation(format!(
                    "failed to read config '{}': {e}",
                    path.display()
                )));
            }
        };

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            StudyError::validation(format!("invalid JSON in config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the base URL is empty or not
    /// http(s), or if the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(StudyError::validation(
                "apiBaseUrl must not be empty; point it at your study service",
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(StudyError::validation(format!(
                "apiBaseUrl must be an http(s) URL, got '{url}'"
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(StudyError::validation(
                "requestTimeoutSecs must be greater than 0",
            ));
        }

        Ok(())
    }
}
