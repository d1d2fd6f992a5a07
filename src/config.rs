//! Map configuration and YAML loading.

use crate::core::Pose2D;
use crate::grid::QueryMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration of a [`BundleGrid`](crate::BundleGrid).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MapConfig {
    /// Cell resolution in meters; bundles are indexed at half of this.
    pub resolution: f64,

    /// Initial world-to-map origin.
    pub origin: Pose2D,

    /// Whether queries at unseen indices may allocate cells.
    pub query_mode: QueryMode,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            origin: Pose2D::identity(),
            query_mode: QueryMode::Allocate,
        }
    }
}

impl MapConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        Ok(())
    }
}

/// Configuration load/save error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing or serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The parsed configuration is not usable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
