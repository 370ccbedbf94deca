//! User configuration file (`~/.shelldock/.sdrc`)

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manager::local_root;
use crate::platform::{PlatformResolver, detect_platform};

pub const CONFIG_FILE_NAME: &str = ".sdrc";

/// Platform setting meaning "detect at run time"
pub const AUTO_PLATFORM: &str = "auto";

/// Errors that can occur while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to determine the home directory")]
    NoHomeDirectory,
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "auto_platform")]
    pub platform: String,
}

fn auto_platform() -> String {
    AUTO_PLATFORM.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            platform: auto_platform(),
        }
    }
}

impl Config {
    /// Whether the platform should be detected rather than taken as configured.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.platform.is_empty() || self.platform == AUTO_PLATFORM
    }
}

/// Handle on a config file location
#[derive(Debug, Clone)]
pub struct UserConfig {
    path: PathBuf,
}

impl UserConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UserConfig { path: path.into() }
    }

    /// The config file under the local repository directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoHomeDirectory` if the home directory cannot be determined.
    pub fn discover() -> Result<Self, ConfigError> {
        let root = local_root().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(UserConfig::new(root.join(CONFIG_FILE_NAME)))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` or `ConfigError::Yaml` if the file exists but is unusable.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            debug!("No config file at {}, using defaults", self.path.display());
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
            path: self.path.clone(),
            source,
        })
    }

    /// Write settings, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Write` if the directory or file cannot be written.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_yaml::to_string(config).map_err(|source| ConfigError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl PlatformResolver for UserConfig {
    fn platform(&self) -> Result<String, ConfigError> {
        let config = self.load()?;
        if config.is_auto() {
            Ok(detect_platform())
        } else {
            Ok(config.platform)
        }
    }
}
