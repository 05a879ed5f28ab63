use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 1500;
pub const API_URL_ENV: &str = "DOCSPACE_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub redirect_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
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

    /// Backend base URL: explicit override, then `DOCSPACE_API_URL`, then the
    /// config file, then the local default.
    pub fn api_url(&self, cli_override: Option<&str>) -> String {
        self.resolve_api_url(cli_override, std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_url(&self, cli_override: Option<&str>, env_value: Option<String>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| env_value.filter(|v| !v.trim().is_empty()))
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms.unwrap_or(DEFAULT_REDIRECT_DELAY_MS))
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("docspace").join("config.json"))
    }

    /// Directory for the persisted session and the TUI log file.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join("docspace"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.redirect_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_save_creates_parent_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: Some("http://docs.internal:9000".to_string()),
            redirect_delay_ms: Some(250),
            log_level: Some("debug".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.redirect_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_cli_override_wins() {
        let config = Config {
            api_url: Some("http://from-config".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_url(Some("http://from-flag")), "http://from-flag");
    }

    #[test]
    fn test_api_url_resolution_order() {
        let configured = Config {
            api_url: Some("http://from-config".to_string()),
            ..Config::default()
        };
        let env = || Some("http://from-env".to_string());

        assert_eq!(
            configured.resolve_api_url(Some("http://from-flag"), env()),
            "http://from-flag"
        );
        assert_eq!(configured.resolve_api_url(None, env()), "http://from-env");
        assert_eq!(Config::new().resolve_api_url(None, env()), "http://from-env");
        assert_eq!(
            configured.resolve_api_url(None, Some("  ".to_string())),
            "http://from-config"
        );
        assert_eq!(configured.resolve_api_url(None, None), "http://from-config");
        assert_eq!(Config::new().resolve_api_url(None, None), DEFAULT_API_URL);
    }
}
