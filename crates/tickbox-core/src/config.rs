//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the auth server URL, request timeout, where the session is
//! stored, and the last email used to log in.
//!
//! Configuration is stored at `~/.config/tickbox/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::REQUEST_TIMEOUT_SECS;
use crate::api::ApiClient;
use crate::auth::{AuthManager, FileStore, KeyValueStore, KeyringStore, SessionStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "tickbox";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Auth server used when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Environment overrides
const ENV_API_URL: &str = "TICKBOX_API_URL";
const ENV_EMAIL: &str = "TICKBOX_EMAIL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `session.json` in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session file
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply `TICKBOX_API_URL` and `TICKBOX_EMAIL` if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = std::env::var(ENV_API_URL).ok().filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(email) = std::env::var(ENV_EMAIL).ok().filter(|v| !v.trim().is_empty()) {
            self.last_email = Some(email);
        }
        self
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS))
    }

    /// Open the configured storage backend
    pub fn session_store(&self) -> Result<SessionStore> {
        let store: Box<dyn KeyValueStore> = match self.storage {
            StorageBackend::File => Box::new(FileStore::new(self.data_dir()?)),
            StorageBackend::Keyring => Box::new(KeyringStore::new(APP_NAME)),
        };
        Ok(SessionStore::new(store))
    }

    /// Wire up an `AuthManager` against the configured server and storage.
    /// The caller still runs `initialize` on it.
    pub fn auth_manager(&self) -> Result<AuthManager> {
        let client = ApiClient::with_timeout(self.api_base_url(), self.request_timeout())
            .context("Failed to create API client")?;
        Ok(AuthManager::new(Arc::new(client), self.session_store()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            api_base_url: Some("https://auth.example.com/api".to_string()),
            request_timeout_secs: Some(5),
            storage: StorageBackend::Keyring,
            last_email: Some("a@b.com".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url(), "https://auth.example.com/api");
        assert_eq!(loaded.request_timeout(), Duration::from_secs(5));
        assert_eq!(loaded.storage, StorageBackend::Keyring);
        assert_eq!(loaded.last_email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert!(loaded.api_base_url.is_none());
        assert!(loaded.last_email.is_none());
    }

    #[test]
    fn test_partial_file_uses_default_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"api_base_url": "http://127.0.0.1:8080"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage, StorageBackend::File);
        assert_eq!(loaded.api_base_url(), "http://127.0.0.1:8080");
    }
}
