//! Configuration for the module runner.
//!
//! Handles loading the optional TOML configuration file of the `zhmc`
//! command. Settings given in module parameters (such as `log_file`) take
//! precedence over the configuration file.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::logging::LogLevel;
use crate::error::{Error, Result};

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log file used when the module parameters do not specify one
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Minimum level written to the log file
    #[serde(default)]
    pub log_level: LogLevel,

    /// Definition file of a faked HMC to run modules against
    #[serde(default)]
    pub faked_hmc: Option<PathBuf>,

    /// Check mode used when the command line does not request it
    #[serde(default)]
    pub check_mode: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: LogLevel::default(),
            faked_hmc: None,
            check_mode: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the configuration file, or `None` for defaults.
    ///
    /// # Returns
    ///
    /// The configuration. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            warn!("Configuration file not found: {}", path.display());
            return Ok(Self::default());
        }
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration: {}", e)))
    }
}
