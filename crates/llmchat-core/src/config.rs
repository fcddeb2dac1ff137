use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::client::DEFAULT_ENDPOINT;
use crate::session::DEFAULT_MAX_PAGES;

pub const BASE_URL_ENV: &str = "LLMCHAT_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub endpoint: String,
    pub max_pages: u32,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the file
    /// doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Apply `LLMCHAT_BASE_URL` if it is set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        let url = std::env::var(BASE_URL_ENV).ok();
        self.with_base_url_override(url.as_deref())
    }

    /// Replace the base URL unless `url` is missing or blank.
    pub fn with_base_url_override(mut self, url: Option<&str>) -> Self {
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => self.base_url = url.to_string(),
            _ => {}
        }
        self
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("llmchat").join("config.json"))
    }
}
