//! Simple CLI configuration loader for concierge
//!
//! Implements single-source priority loading with overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./concierge.json or ./.concierge/config.json
//! 3. User config: <config_dir>/concierge/config.json
//! 4. Built-in defaults (no files)
//!
//! Environment variables are applied on top of the chosen source, then flags.

use anyhow::{anyhow, Context, Result};
use concierge_core::{ConciergeConfig, DataSource, SandboxConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the CSV data directory
pub const DATA_DIR_ENV: &str = "CONCIERGE_DATA_DIR";
/// Overrides the weather forecast endpoint
pub const WEATHER_URL_ENV: &str = "CONCIERGE_WEATHER_URL";

/// Raw configuration file format; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    pub data_dir: Option<PathBuf>,
    pub events: Option<DataSource>,
    pub stores: Option<DataSource>,
    pub products: Option<DataSource>,
    pub sandbox: Option<SandboxConfig>,
    #[serde(default)]
    pub weather: RawWeatherConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWeatherConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Merged into the default area codes
    #[serde(default)]
    pub area_codes: HashMap<String, String>,
}

impl RawConfig {
    /// Lay the file's values over the built-in defaults
    pub fn into_config(self) -> ConciergeConfig {
        let mut config = ConciergeConfig::default();

        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(events) = self.events {
            config.events = events;
        }
        if let Some(stores) = self.stores {
            config.stores = stores;
        }
        if let Some(products) = self.products {
            config.products = products;
        }
        if let Some(sandbox) = self.sandbox {
            config.sandbox = sandbox;
        }
        if let Some(base_url) = self.weather.base_url {
            config.weather.base_url = base_url;
        }
        if let Some(timeout_secs) = self.weather.timeout_secs {
            config.weather.timeout_secs = timeout_secs;
        }
        config.weather.area_codes.extend(self.weather.area_codes);

        config
    }
}

/// CLI configuration loader
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    data_dir_override: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            config_override: None,
            data_dir_override: None,
        }
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set data directory override
    pub fn with_data_dir_override(mut self, data_dir: PathBuf) -> Self {
        self.data_dir_override = Some(data_dir);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<ConciergeConfig> {
        // Step 1: Find and load base configuration
        let raw = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load().await?
        };
        let mut config = raw.into_config();

        // Step 2: Apply environment overrides
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        // Step 3: Apply flag overrides
        if let Some(data_dir) = &self.data_dir_override {
            config.data_dir = data_dir.clone();
        }

        config
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        Ok(config)
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<RawConfig> {
        if let Some(config) = self.try_load_cwd().await? {
            return Ok(config);
        }

        if let Some(config) = self.try_load_user_dir().await? {
            return Ok(config);
        }

        debug!("No config file found, using defaults");
        Ok(RawConfig::default())
    }

    /// Try loading from current working directory
    async fn try_load_cwd(&self) -> Result<Option<RawConfig>> {
        let cwd = std::env::current_dir()?;

        let concierge_json = cwd.join("concierge.json");
        if concierge_json.exists() {
            return Ok(Some(self.load_file(&concierge_json).await?));
        }

        let dir_config = cwd.join(".concierge").join("config.json");
        if dir_config.exists() {
            return Ok(Some(self.load_file(&dir_config).await?));
        }

        Ok(None)
    }

    /// Try loading from the user's config directory
    async fn try_load_user_dir(&self) -> Result<Option<RawConfig>> {
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("concierge").join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }
        Ok(None)
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `CONCIERGE_*` overrides read through `lookup`
fn apply_env_overrides<F>(config: &mut ConciergeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(data_dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        config.data_dir = PathBuf::from(data_dir);
    }
    if let Some(url) = lookup(WEATHER_URL_ENV).filter(|v| !v.is_empty()) {
        config.weather.base_url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "data_dir": "/srv/concierge",
                "sandbox": { "max_rows": 5 },
                "weather": { "area_codes": { "Osaka": "270000" } }
            }"#,
        )
        .unwrap();
        let config = raw.into_config();

        assert_eq!(config.data_dir, PathBuf::from("/srv/concierge"));
        assert_eq!(config.sandbox.max_rows, 5);
        assert_eq!(config.events.virtual_name, "events.csv");
        assert_eq!(config.weather.area_codes.get("Osaka").unwrap(), "270000");
        assert_eq!(config.weather.area_codes.get("東京").unwrap(), "130000");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConciergeConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            DATA_DIR_ENV => Some("/data".to_string()),
            WEATHER_URL_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(
            config.weather.base_url,
            ConciergeConfig::default().weather.base_url
        );
    }

    #[tokio::test]
    async fn test_config_override_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{ "data_dir": "fixtures" }"#,
        )
        .unwrap();

        let loader = CliConfigLoader::new().with_config_override(dir.path().to_path_buf());
        let raw = loader.load_from_path(dir.path()).await.unwrap();
        assert_eq!(raw.data_dir, Some(PathBuf::from("fixtures")));

        let config = loader
            .with_data_dir_override(PathBuf::from("elsewhere"))
            .load()
            .await
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("elsewhere"));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("concierge.json");
        std::fs::write(&path, r#"{ "sandbox": { "max_rows": 100 } }"#).unwrap();

        let err = CliConfigLoader::new()
            .with_config_override(path)
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[tokio::test]
    async fn test_missing_override_path() {
        let dir = TempDir::new().unwrap();
        let err = CliConfigLoader::new()
            .with_config_override(dir.path().join("nope.json"))
            .load()
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("does not exist"));
    }
}
