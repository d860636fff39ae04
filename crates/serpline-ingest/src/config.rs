//! Configuration loading from TOML files
//!
//! The config maps each web property to an ordered list of per-property
//! settings; every (property, settings) pair becomes one import job. Keys
//! inside a settings table keep the reporting-config spelling
//! (`dateDaysAgo`, `searchTypes`, `aggregationType`, `tablename`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Lookback applied when a settings table has no `dateDaysAgo`
pub const DEFAULT_LOOKBACK_DAYS: u32 = 3;

/// Dimensions requested when a settings table has no `dimensions`
pub const DEFAULT_DIMENSIONS: [&str; 4] = ["page", "device", "query", "country"];

/// Search types iterated when a settings table has no `searchTypes`
pub const DEFAULT_SEARCH_TYPES: [&str; 3] = ["web", "image", "video"];

/// Default document collection for document-store destinations
pub const DEFAULT_COLLECTION: &str = "search_console";

/// Global configuration for serpline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub destination: DestinationConfig,
    pub workers: WorkersConfig,
    /// Property URL -> ordered settings list, one job per entry.
    ///
    /// BTreeMap keeps property iteration deterministic; the settings list
    /// keeps its configured order.
    pub properties: BTreeMap<String, Vec<PropertySettings>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Fallback credential file for properties without their own
    pub credentials: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/webmasters/v3".to_string(),
            credentials: None,
        }
    }
}

/// Which kind of data store jobs write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DestinationKind {
    Warehouse,
    DocumentStore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub kind: DestinationKind,
    /// Collection name for document-store destinations
    pub collection: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            kind: DestinationKind::DocumentStore,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        // Sequential by default; parallel across jobs is opt-in
        Self { default: 1, max: 8 }
    }
}

/// One settings table for a property. Absent keys fall back to the named
/// defaults at job resolution; `tablename` is required only for warehouse
/// destinations and checked per job.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertySettings {
    pub credentials: Option<PathBuf>,
    pub date_days_ago: Option<u32>,
    pub dimensions: Option<Vec<String>>,
    pub search_types: Option<Vec<String>>,
    pub aggregation_type: Option<String>,
    pub tablename: Option<String>,
    pub dataset: Option<String>,
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./serpline.toml (current directory)
    /// 2. ~/.config/serpline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("serpline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "serpline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Total number of configured (property, settings) jobs.
    pub fn job_count(&self) -> usize {
        self.properties.values().map(Vec::len).sum()
    }
}
