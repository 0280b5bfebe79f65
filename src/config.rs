//! Application configuration management.
//!
//! Configuration is stored at `~/.config/tapdeck/config.json`. The API base
//! URL and WebSocket URL can be overridden with the `TAPDECK_API_URL` and
//! `TAPDECK_WS_URL` environment variables (also honored from a `.env` file).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "tapdeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default backend base URL
const DEFAULT_API_URL: &str = "https://bored-tap-api.onrender.com";

/// Default live-feed WebSocket URL
const DEFAULT_WS_URL: &str = "wss://bored-tap-api.onrender.com/ws";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_base_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    pub last_username: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_url(),
            ws_url: default_ws_url(),
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        // Environment overrides win over the config file
        if let Ok(url) = std::env::var("TAPDECK_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("TAPDECK_WS_URL") {
            config.ws_url = url;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
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

    /// Directory holding the session file and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let config = Config::default();
        assert!(config.api_base_url.starts_with("https://"));
        assert!(config.ws_url.starts_with("wss://"));
        assert!(config.last_username.is_none());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        // Old config files may predate the ws_url field
        let config: Config = serde_json::from_str(r#"{"last_username": "admin"}"#)
            .expect("partial config should parse");
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.last_username.as_deref(), Some("admin"));
    }
}
