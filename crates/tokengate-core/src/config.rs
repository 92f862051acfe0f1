//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL, the token store to use, and the request
//! timeout. Credentials are never written here.
//!
//! Configuration is stored at `~/.config/tokengate/config.json`. The backend
//! URL and token store can be overridden from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::api::ApiClient;
use crate::auth::{FileTokenStore, KeyringTokenStore, TokenStore};

/// Application name used for config/data directory paths
pub(crate) const APP_NAME: &str = "tokengate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured
const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

pub const BACKEND_URL_ENV: &str = "TOKENGATE_BACKEND_URL";
pub const TOKEN_STORE_ENV: &str = "TOKENGATE_TOKEN_STORE";

/// Where the bearer token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
}

impl FromStr for TokenStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(TokenStoreKind::File),
            "keyring" | "keychain" => Ok(TokenStoreKind::Keyring),
            other => Err(anyhow::anyhow!("Unknown token store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub token_store: TokenStoreKind,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            token_store: TokenStoreKind::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load the config file and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config file if none exists yet, so users have
    /// something to edit. Returns the path either way.
    pub fn init_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the environment in practice)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }
        if let Some(kind) = lookup(TOKEN_STORE_ENV).filter(|v| !v.trim().is_empty()) {
            self.token_store = kind
                .parse()
                .with_context(|| format!("Invalid {}", TOKEN_STORE_ENV))?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// `scheme://host[:port]` of the backend; the scope of a stored token
    pub fn origin(&self) -> Result<String> {
        let url = Url::parse(&self.backend_url)
            .with_context(|| format!("Invalid backend URL: {}", self.backend_url))?;
        let origin = url.origin();
        if !origin.is_tuple() {
            anyhow::bail!("Backend URL has no origin: {}", self.backend_url);
        }
        Ok(origin.ascii_serialization())
    }

    /// Per-request timeout; `0` means unset and falls back to the default
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        // Validates the URL before any request is attempted
        self.origin()?;
        ApiClient::with_timeout(&self.backend_url, self.request_timeout())
    }

    /// Build the configured token store for this backend's origin
    pub fn token_store(&self) -> Result<Box<dyn TokenStore + Send + Sync>> {
        let origin = self.origin()?;
        Ok(match self.token_store {
            TokenStoreKind::File => Box::new(FileTokenStore::for_origin(&origin)?),
            TokenStoreKind::Keyring => Box::new(KeyringTokenStore::new(origin)?),
        })
    }
}
