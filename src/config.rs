//! Configuration management
//!
//! One resolution routine for the hosted backend's base URL and API key,
//! shared by the playlist service, the health audit and the harness.
//! Precedence for the key: `SUPABASE_KEY`, then `VITE_SUPABASE_ANON_KEY`,
//! then the config file, then a visible placeholder. A `.env` file in the
//! working directory is loaded first and never overrides real env vars.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_BACKEND_URL: &str = "https://vifeazkwjreoxkspbygg.supabase.co";
pub const KEY_PLACEHOLDER: &str = "<YOUR_SUPABASE_ANON_OR_SERVICE_KEY>";

pub const URL_ENV: &str = "SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_KEY";
pub const ANON_KEY_ENV: &str = "VITE_SUPABASE_ANON_KEY";

const APP_DIR: &str = "playlist_cloud";

/// Persisted settings (config.json in the user's config dir)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    pub fn load() -> Self {
        let path = Self::config_path();

        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring malformed {}: {}", path.display(), e),
                }
            }
        }

        Self::default()
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        log::info!("Saved backend settings to {}", path.display());
        Ok(())
    }
}

/// Where the resolved API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment(&'static str),
    ConfigFile,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub key_source: KeySource,
}

impl BackendConfig {
    /// Resolve from `.env`, the process environment and the config file.
    pub fn resolve() -> Self {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::resolve_from(|name| std::env::var(name).ok(), &AppConfig::load())
    }

    /// Resolution with the environment lookup injected.
    pub fn resolve_from<F>(env: F, file: &AppConfig) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = lookup(URL_ENV)
            .or_else(|| Some(file.backend_url.trim().to_string()).filter(|u| !u.is_empty()))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let (api_key, key_source) = if let Some(key) = lookup(KEY_ENV) {
            (key, KeySource::Environment(KEY_ENV))
        } else if let Some(key) = lookup(ANON_KEY_ENV) {
            (key, KeySource::Environment(ANON_KEY_ENV))
        } else if !file.api_key.trim().is_empty() {
            (file.api_key.trim().to_string(), KeySource::ConfigFile)
        } else {
            (KEY_PLACEHOLDER.to_string(), KeySource::Placeholder)
        };

        Self {
            url: url.trim_end_matches('/').to_string(),
            api_key,
            key_source,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.key_source == KeySource::Placeholder
    }

    /// Fails when no real key was found anywhere.
    pub fn require_key(self) -> Result<Self> {
        if self.is_placeholder() {
            log::error!("Backend key not found. Check your .env file.");
            return Err(Error::MissingKey);
        }
        Ok(self)
    }

    /// `<base>/rest/v1/<table>`
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}
