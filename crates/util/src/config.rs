//! Panel configuration for the Knobs CLI.
//!
//! A small JSON file in the standard configuration directory
//! (`~/.config/knobs/config.json` on most platforms) naming the fallback
//! provider, where provider descriptors live, and whether edits are validated
//! as they happen.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "KNOBS_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Error surfaced when reading or writing the config fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted panel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Provider used when the session names one that no longer exists.
    pub default_provider: Option<String>,
    /// Directory holding provider descriptor files.
    pub catalog_dir: Option<PathBuf>,
    /// Validate each edit immediately instead of deferring to a full pass.
    pub validate_on_change: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            catalog_dir: None,
            validate_on_change: true,
        }
    }
}

impl PanelConfig {
    /// Loads the config from [`default_config_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    /// Loads the config at `path`.
    ///
    /// A missing file yields defaults, and so does a malformed one after a warning.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(error) => return Err(ConfigError::Io(error)),
        };
        match serde_json::from_str::<Self>(&data) {
            Ok(mut config) => {
                config.catalog_dir = config
                    .catalog_dir
                    .map(|dir| dir.to_str().map(expand_tilde).unwrap_or(dir));
                Ok(config)
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse config file; using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Resolves the config file path, honoring [`CONFIG_PATH_ENV`].
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("knobs")
        .join(CONFIG_FILE_NAME)
}
