//! Host configuration loaded from `marionette-config.yaml`.
//!
//! Every section and field has a default, so a missing file or a
//! partial one still produces a runnable configuration.

use std::path::{Path, PathBuf};

use marionette_gateway::ApiConfig;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Complete host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// External API gateway settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Display and timing settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Model asset settings.
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Display and timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Tick loop frequency in Hz.
    pub tick_rate_hz: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { tick_rate_hz: 60 }
    }
}

/// Model asset settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory relative model paths resolve against.
    pub root: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("models"),
        }
    }
}

impl HostConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] when the file cannot be read or
    /// parsed.
    pub fn from_file(path: &Path) -> Result<Self, HostError> {
        let contents = std::fs::read_to_string(path).map_err(HostError::config)?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] when the YAML is malformed.
    pub fn from_str(yaml: &str) -> Result<Self, HostError> {
        serde_yml::from_str(yaml).map_err(HostError::config)
    }
}
