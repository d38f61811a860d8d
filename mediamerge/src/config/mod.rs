//! Merge configuration.
//!
//! [`MergeConfig`] is the validated input of a merge run. [`ConfigFile`] reads
//! it from the JSON file the service is deployed with.

mod file;
mod merge_config;

pub use file::{config_file_path, ConfigError, ConfigFile, CONFIG_FILE_NAME, CONFIG_PATH_ENV};
pub use merge_config::{MergeConfig, RescanConfig, TypeConfig, DEFAULT_RESCAN_TIMEOUT_SECS};
