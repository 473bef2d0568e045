//! # Modtree Engine Configuration
//!
//! Engine-wide settings that are not part of any component type: how a
//! closing component waits for its outstanding references, and how loudly
//! the dispatch walks report visited nodes.
//!
//! Configuration files may be JSON, TOML (`toml-config` feature) or YAML
//! (`yaml-config` feature); the format is picked from the file extension.
//! Missing keys fall back to their defaults.
pub mod error;

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json;
#[cfg(feature = "yaml-config")]
use serde_yaml;
#[cfg(feature = "toml-config")]
use toml;

use crate::component::rundown::RundownWait;
use crate::config::error::ConfigError;
use crate::kernel::constants;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Human-readable format name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "YAML",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "TOML",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    /// Deserialize any document in this format
    pub fn parse<T: DeserializeOwned>(&self, data: &str) -> Result<T, ConfigError> {
        let parsed: Result<T, Box<dyn std::error::Error + Send + Sync>> = match self {
            ConfigFormat::Json => serde_json::from_str(data).map_err(Into::into),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(Into::into),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(Into::into),
        };
        parsed.map_err(|source| ConfigError::Deserialization {
            format: self.name().to_string(),
            source,
        })
    }

    /// Serialize any value in this format
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String, ConfigError> {
        let rendered: Result<String, Box<dyn std::error::Error + Send + Sync>> = match self {
            ConfigFormat::Json => serde_json::to_string_pretty(value).map_err(Into::into),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(value).map_err(Into::into),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(value).map_err(Into::into),
        };
        rendered.map_err(|source| ConfigError::Serialization {
            format: self.name().to_string(),
            source,
        })
    }
}

/// How a closing component waits for outstanding references to drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RundownStrategy {
    /// Sleep until the last outstanding reference is released
    #[default]
    Notify,
    /// Re-check the reference count every `poll_interval_ms`
    Poll,
}

/// Rundown settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RundownConfig {
    pub strategy: RundownStrategy,
    pub poll_interval_ms: u64,
}

impl Default for RundownConfig {
    fn default() -> Self {
        Self {
            strategy: RundownStrategy::default(),
            poll_interval_ms: constants::DEFAULT_RUNDOWN_POLL_INTERVAL_MS,
        }
    }
}

/// Engine configuration shared by every component of a tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log every visited node at `debug` instead of `trace`
    pub trace_visits: bool,
    pub rundown: RundownConfig,
}

impl EngineConfig {
    /// Parse and validate a configuration document
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: EngineConfig = format.parse(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading engine configuration from {}", path.display());
        Self::parse(&data, format)
    }

    /// Load from `path` if given, else from the file named by the
    /// `MODTREE_CONFIG` environment variable, else use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(constants::CONFIG_ENV_VAR) {
            Some(env_path) => Self::load(Path::new(&env_path)),
            None => Ok(Self::default()),
        }
    }

    /// Serialize to a document in the given format
    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        format.render(self)
    }

    /// Check values that serde cannot express as types
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rundown.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "rundown.poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Rundown wait mode handed to each component at construction
    pub fn rundown_wait(&self) -> RundownWait {
        match self.rundown.strategy {
            RundownStrategy::Notify => RundownWait::Notify,
            RundownStrategy::Poll => {
                RundownWait::Poll(Duration::from_millis(self.rundown.poll_interval_ms))
            }
        }
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
