//! Collector configuration loading and validation.
//!
//! The configuration is a JSON file naming the ClickHouse connection and the
//! locations to collect. It is looked up at the system path first and at the
//! per-user config directory second, unless a path is given explicitly.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CLICKHOUSE_SCHEME, DEFAULT_SERVICE_URL,
    SYSTEM_CONFIG_PATH,
};
use crate::error::{CollectorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// ClickHouse connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    /// Candidate addresses, tried in order
    #[serde(rename = "address")]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    pub database: String,
}

impl ClickHouseConfig {
    /// Addresses as HTTP URLs, with `http://` added where no scheme is given
    pub fn urls(&self) -> Vec<String> {
        self.addresses
            .iter()
            .map(|address| {
                let address = address.trim();
                if address.contains("://") {
                    address.to_string()
                } else {
                    format!("{}{}", DEFAULT_CLICKHOUSE_SCHEME, address)
                }
            })
            .collect()
    }
}

/// Top-level collector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub clickhouse: ClickHouseConfig,

    /// Place names passed to the weather service, processed in order
    pub locations: Vec<String>,

    /// WFS endpoint
    #[serde(default = "default_service_url")]
    pub service_url: String,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

impl Config {
    pub fn new(clickhouse: ClickHouseConfig, locations: Vec<String>) -> Self {
        Self {
            clickhouse,
            locations,
            service_url: default_service_url(),
        }
    }

    /// Use a different WFS endpoint
    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = service_url.into();
        self
    }

    /// Replace the configured locations
    pub fn with_locations(mut self, locations: Vec<String>) -> Self {
        self.locations = locations;
        self
    }

    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| CollectorError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate().map_err(|e| CollectorError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Check the settings a run cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.clickhouse.addresses.is_empty() {
            return Err(CollectorError::configuration(
                "At least one ClickHouse address is required",
            ));
        }

        if let Some(blank) = self
            .clickhouse
            .addresses
            .iter()
            .position(|a| a.trim().is_empty())
        {
            return Err(CollectorError::configuration(format!(
                "ClickHouse address {} is blank",
                blank + 1
            )));
        }

        if self.clickhouse.database.trim().is_empty() {
            return Err(CollectorError::configuration(
                "ClickHouse database name is required",
            ));
        }

        if self.locations.is_empty() {
            return Err(CollectorError::configuration(
                "At least one location is required",
            ));
        }

        if let Some(blank) = self.locations.iter().position(|l| l.trim().is_empty()) {
            return Err(CollectorError::configuration(format!(
                "Location {} is blank",
                blank + 1
            )));
        }

        if self.service_url.trim().is_empty() {
            return Err(CollectorError::configuration("Service URL is empty"));
        }

        Ok(())
    }

    /// Default configuration file location.
    ///
    /// The system path wins when it exists; otherwise the per-user config
    /// directory is used when one can be determined.
    pub fn default_config_path() -> PathBuf {
        let system = PathBuf::from(SYSTEM_CONFIG_PATH);
        if system.exists() {
            return system;
        }

        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .unwrap_or(system)
    }
}
