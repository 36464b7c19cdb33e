//! Configuration for the evees binary

use std::path::{Path, PathBuf};

use evees_core::ResolveOptions;
use evees_logging::LogConfig;
use evees_resolve::ResolverConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration, read from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EveesConfig {
    /// Base directory for all stored data
    pub data_dir: PathBuf,
    /// Origin recorded on every perspective this store creates
    pub origin: String,
    /// Logging configuration
    pub log: LogConfig,
    /// Options used when a command does not override them
    pub resolve: ResolveOptions,
    /// Concurrency limits
    pub resolver: ResolverConfig,
}

impl Default for EveesConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./evees-data"),
            origin: String::from("local"),
            log: LogConfig::default(),
            resolve: ResolveOptions::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl EveesConfig {
    /// Load a configuration file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the origin stamped on new perspectives
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Directory holding content objects
    pub fn objects_dir(&self) -> PathBuf {
        self.data_dir.join("objects")
    }

    /// Directory holding the perspective log
    pub fn perspectives_dir(&self) -> PathBuf {
        self.data_dir.join("perspectives")
    }
}
