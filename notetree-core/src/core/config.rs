//! Client configuration persistence.
//!
//! Stores connection settings in a JSON file at an OS-appropriate location.
//! The loaded [`ClientConfig`] is passed explicitly to whatever talks to the
//! server; nothing reads configuration per call.

use crate::{Result, GENERIC_FAILURE_MESSAGE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides [`ClientConfig::api_base_url`].
pub const API_URL_ENV: &str = "NOTETREE_API_URL";

/// Persisted client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL of the note backend, without a trailing slash.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Shown when a failed request carries no server message.
    pub fallback_error_message: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 10,
            fallback_error_message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Applies `NOTETREE_API_URL`, if set and non-empty.
    #[must_use]
    pub fn with_env_override(self) -> Self {
        self.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.map(|u| u.trim().trim_end_matches('/').to_string()) {
            if !url.is_empty() {
                log::debug!("API base URL overridden to {url}");
                self.api_base_url = url;
            }
        }
        self
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/notetree/settings.json`
/// - Windows: `%APPDATA%/Notetree/settings.json`
#[must_use]
pub fn config_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Notetree").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("notetree").join("settings.json")
    }
}

/// Loads settings from the default location; returns defaults if the file is missing or corrupt.
#[must_use]
pub fn load_config() -> ClientConfig {
    load_config_from(&config_file_path())
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
#[must_use]
pub fn load_config_from(path: &Path) -> ClientConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring corrupt settings file {}: {e}", path.display());
            ClientConfig::default()
        }),
        Err(_) => ClientConfig::default(),
    }
}

/// Saves settings to the default location.
pub fn save_config(config: &ClientConfig) -> Result<()> {
    save_config_to(&config_file_path(), config)
}

/// Saves settings to `path`, creating parent directories as needed.
pub fn save_config_to(path: &Path, config: &ClientConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}
