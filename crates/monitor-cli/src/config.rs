//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Server URL used when neither flag, env nor config file sets one
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Default output format (table or json)
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("dmon").join("config.json"))
    }

    /// Pick the API URL: explicit flag or env first, then the config file
    pub fn resolve_api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Pick the output format: explicit flag first, then the config file
    pub fn resolve_format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or_else(|| {
            self.default_format
                .as_deref()
                .and_then(|f| <OutputFormat as clap::ValueEnum>::from_str(f, true).ok())
        })
        .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: Some("http://monitor:9000".to_string()),
            default_format: Some("json".to_string()),
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_resolution_order() {
        let config = Config {
            api_url: Some("http://from-file:8080".to_string()),
            default_format: Some("json".to_string()),
        };

        assert_eq!(
            config.resolve_api_url(Some("http://flag:1".to_string())),
            "http://flag:1"
        );
        assert_eq!(config.resolve_api_url(None), "http://from-file:8080");
        assert_eq!(Config::default().resolve_api_url(None), DEFAULT_API_URL);

        assert!(matches!(config.resolve_format(None), OutputFormat::Json));
        assert!(matches!(
            config.resolve_format(Some(OutputFormat::Table)),
            OutputFormat::Table
        ));
        assert!(matches!(
            Config::default().resolve_format(None),
            OutputFormat::Table
        ));
    }
}
