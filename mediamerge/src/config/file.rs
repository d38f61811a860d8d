//! JSON configuration file loading.
//!
//! The file is a JSON object whose `MEDIA_MERGE` key holds the [`MergeConfig`].
//! Other top-level keys are ignored, so the same file can carry settings for
//! neighbouring services.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::merge_config::MergeConfig;

/// Environment variable overriding the default configuration path.
pub const CONFIG_PATH_ENV: &str = "MEDIAMERGE_CONFIG";

/// Configuration file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Errors from reading or parsing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// The file is not valid JSON or does not match the expected shape.
    #[error("failed to parse {}: {reason}", .path.display())]
    ParseFailed { path: PathBuf, reason: String },
}

/// On-disk layout of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "MEDIA_MERGE")]
    pub media_merge: MergeConfig,
}

impl ConfigFile {
    /// Load and parse a configuration file.
    ///
    /// Parsing only checks the JSON shape; call [`MergeConfig::validate`] for
    /// the semantic checks.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let file: Self =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            path = %path.display(),
            types = file.media_merge.types.len(),
            "Loaded configuration"
        );
        Ok(file)
    }

    /// Load from [`config_file_path`].
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&config_file_path())
    }

    /// The merge section.
    pub fn merge_config(&self) -> &MergeConfig {
        &self.media_merge
    }

    /// Consume the file, keeping the merge section.
    pub fn into_merge_config(self) -> MergeConfig {
        self.media_merge
    }
}

impl From<MergeConfig> for ConfigFile {
    fn from(media_merge: MergeConfig) -> Self {
        Self { media_merge }
    }
}

/// Resolve the configuration file path.
///
/// `$MEDIAMERGE_CONFIG` wins; otherwise `<config dir>/mediamerge/config.json`,
/// falling back to `./config.json` when the platform has no config directory.
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .map(|dir| dir.join("mediamerge").join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}
