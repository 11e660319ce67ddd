//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the data service URL and the last signed-in user.
//!
//! Configuration is stored at `~/.config/fitcache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "fitcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default base URL for the data service's API routes.
const DEFAULT_SERVICE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub service_url: Option<String>,
    pub last_user: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
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

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// The effective service URL: explicit config or the default.
    pub fn service_url(&self) -> &str {
        self.service_url.as_deref().unwrap_or(DEFAULT_SERVICE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_url() {
        let config = Config::default();
        assert_eq!(config.service_url(), DEFAULT_SERVICE_URL);

        let config = Config {
            service_url: Some("https://fit.example.org/api".to_string()),
            last_user: None,
        };
        assert_eq!(config.service_url(), "https://fit.example.org/api");
    }

    #[test]
    fn test_config_round_trip_json() {
        let config = Config {
            service_url: Some("https://fit.example.org/api".to_string()),
            last_user: Some("alice".to_string()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.service_url, config.service_url);
        assert_eq!(parsed.last_user, config.last_user);
    }
}
