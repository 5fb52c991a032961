use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::state::DEFAULT_GREETING;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 10;

/// Environment variable that overrides `api_url` from the config file
pub const API_URL_ENV: &str = "JARVIS_API_URL";

/// Presentation flavour of the chat view. Both share the same behavior.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewVariant {
    /// User messages right-aligned, empty-state panel with shortcuts
    #[default]
    Welcome,
    /// Every message left-aligned under a role label, no empty-state panel
    Classic,
}

impl ViewVariant {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "welcome" => Some(ViewVariant::Welcome),
            "classic" => Some(ViewVariant::Classic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewVariant::Welcome => "welcome",
            ViewVariant::Classic => "classic",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub probe_interval_secs: u64,
    pub variant: ViewVariant,
    pub greeting: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            variant: ViewVariant::default(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl Config {
    /// Load from the user config dir, then apply environment overrides.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url;
            }
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Polling period for the connectivity monitor, never below one second
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("jarvis").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.probe_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_url: "http://jarvis.lan:9000".to_string(),
            probe_interval_secs: 30,
            variant: ViewVariant::Classic,
            greeting: "Good evening.".to_string(),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "variant": "classic" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.variant, ViewVariant::Classic);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.greeting, DEFAULT_GREETING);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_probe_interval_has_floor() {
        let config = Config {
            probe_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.probe_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!(ViewVariant::from_str("Classic"), Some(ViewVariant::Classic));
        assert_eq!(ViewVariant::from_str("welcome"), Some(ViewVariant::Welcome));
        assert_eq!(ViewVariant::from_str("fancy"), None);
    }
}
