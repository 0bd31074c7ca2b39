//! Client configuration
//!
//! Stored as JSON at `~/.property-portal/config.json`. Missing keys take their
//! defaults; `PROPERTY_PORTAL_API_URL` overrides the API base URL.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = ".property-portal";
pub const API_URL_ENV: &str = "PROPERTY_PORTAL_API_URL";

/// Settings for talking to the property API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Endpoint paths are joined onto this URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sent as a bearer token on every step request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Where wizard drafts are kept; defaults to `drafts/` next to the config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drafts_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            auth_token: None,
            drafts_dir: None,
        }
    }
}

pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR_NAME))
}

pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("config.json"))
}

impl ClientConfig {
    /// Loads the user config, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("home directory not found, using default client config");
                Self::default()
            }
        };
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        config
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<ClientConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "failed to parse config, using defaults. path: {}, error: {}",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("failed to create directory: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| format!("serialization failed: {}", e))?;
        fs::write(path, json).map_err(|e| format!("failed to write config: {}", e))?;
        Ok(())
    }

    fn apply_env_override(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn resolved_drafts_dir(&self) -> Option<PathBuf> {
        self.drafts_dir
            .clone()
            .or_else(|| app_dir().map(|dir| dir.join("drafts")))
    }
}
