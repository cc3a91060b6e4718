//! Configuration management for Resiz

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResizError, Result};

pub mod profiles;
pub mod request;

pub use profiles::*;
pub use request::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker pool settings
    pub processing: ProcessingConfig,

    /// Values applied when a batch leaves them unset
    pub defaults: DefaultsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Named option bundles
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            processing: ProcessingConfig::default(),
            defaults: DefaultsConfig::default(),
            logging: LoggingConfig::default(),
            profiles: Profiles::all(),
        }
    }
}

/// Global processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of concurrent conversions (None = auto-detect)
    pub threads: Option<usize>,
}

/// Fallback option values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Output quality (0-99)
    pub quality: i64,

    /// Output format name
    pub format: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            quality: i64::from(DEFAULT_QUALITY),
            format: crate::processing::OutputFormat::DEFAULT.extension().to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from a `.toml`, `.yaml` or `.yml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResizError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        match extension_of(path).as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(ResizError::config(
                "Unsupported config file format. Use .toml or .yaml",
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match extension_of(path).as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| ResizError::config(format!("TOML serialization failed: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| ResizError::config(format!("YAML serialization failed: {}", e)))?,
            _ => {
                return Err(ResizError::config(
                    "Unsupported config file format. Use .toml or .yaml",
                ))
            }
        };

        std::fs::write(path, content).map_err(|e| {
            ResizError::config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Get a profile by name
    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        self.profiles.get(name).ok_or_else(|| {
            let mut available: Vec<_> = self.profiles.keys().collect();
            available.sort();
            ResizError::config(format!(
                "Profile '{}' not found. Available profiles: {:?}",
                name, available
            ))
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.processing.threads == Some(0) {
            return Err(ResizError::config("Thread count must be greater than 0"));
        }

        validate_quality(self.defaults.quality)
            .map_err(|e| ResizError::config(format!("Invalid default quality: {}", e)))?;

        for (name, profile) in &self.profiles {
            profile
                .validate()
                .map_err(|e| ResizError::config(format!("Invalid profile '{}': {}", name, e)))?;
        }

        Ok(())
    }

    /// Fill options the caller left unset from `profile` and then from the defaults
    pub fn apply_to(&self, mut options: BatchOptions, profile: Option<&str>) -> Result<BatchOptions> {
        if let Some(name) = profile {
            options = self.get_profile(name)?.apply_to(options);
        }

        options.quality.get_or_insert(self.defaults.quality);
        options
            .format
            .get_or_insert_with(|| self.defaults.format.clone());

        Ok(options)
    }

    /// Default config file location, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/resiz/resiz.toml"))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}
