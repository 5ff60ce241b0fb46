//! Resolved configuration types for concierge core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Hard upper bound on rows a sandboxed query may return
pub const MAX_RESULT_ROWS: usize = 10;

/// A tabular data file exposed to the model under a stable logical name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Table name the model writes in its SQL (e.g. `events.csv`)
    pub virtual_name: String,
    /// Backing CSV file, relative to `data_dir` unless absolute
    pub file: PathBuf,
}

impl DataSource {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(virtual_name: S, file: P) -> Self {
        Self {
            virtual_name: virtual_name.into(),
            file: file.into(),
        }
    }
}

/// Limits applied by the SQL sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Maximum rows returned per query
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_max_rows() -> usize {
    MAX_RESULT_ROWS
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_rows: MAX_RESULT_ROWS,
        }
    }
}

/// Weather forecast API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast endpoint; `<base_url>/<area_code>.json` is fetched
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Supported locations mapped to forecast area codes
    pub area_codes: HashMap<String, String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        let mut area_codes = HashMap::new();
        area_codes.insert("東京".to_string(), "130000".to_string());
        area_codes.insert("Tokyo".to_string(), "130000".to_string());

        Self {
            base_url: "https://www.jma.go.jp/bosai/forecast/data/forecast".to_string(),
            timeout_secs: 10,
            area_codes,
        }
    }
}

/// A fully resolved concierge configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConciergeConfig {
    /// Directory holding the CSV data files
    pub data_dir: PathBuf,
    pub events: DataSource,
    pub stores: DataSource,
    pub products: DataSource,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl Default for ConciergeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("input"),
            events: DataSource::new("events.csv", "events.csv"),
            stores: DataSource::new("stores.csv", "filtered_store_data.csv"),
            products: DataSource::new("filtered_product_data.csv", "filtered_product_data.csv"),
            sandbox: SandboxConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl ConciergeConfig {
    /// Set the data directory
    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Absolute-or-relative path of a source's backing file
    pub fn resolve(&self, source: &DataSource) -> PathBuf {
        resolve_path(&self.data_dir, &source.file)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sandbox.max_rows == 0 || self.sandbox.max_rows > MAX_RESULT_ROWS {
            return Err(ConfigError::InvalidValue {
                field: "sandbox.max_rows".to_string(),
                value: self.sandbox.max_rows.to_string(),
            });
        }

        for (field, source) in [
            ("events", &self.events),
            ("stores", &self.stores),
            ("products", &self.products),
        ] {
            if source.virtual_name.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("{}.virtual_name", field),
                });
            }
            if source.file.as_os_str().is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("{}.file", field),
                });
            }
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "weather.base_url".to_string(),
                value: self.weather.base_url.clone(),
            });
        }

        if self.weather.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "weather.timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

fn resolve_path(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.join(file)
    }
}
