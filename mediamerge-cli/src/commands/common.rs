//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use mediamerge::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// The `--config` path if given, else the default location.
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    cli_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

/// Load the configuration file and validate its merge section.
pub fn load_validated(cli_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = resolve_config_path(cli_path);
    let file = ConfigFile::load(&path)?;
    file.merge_config()
        .validate()
        .map_err(CliError::InvalidConfig)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_path_takes_precedence() {
        let path = Path::new("/srv/mediamerge.json");
        assert_eq!(resolve_config_path(Some(path)), path);
    }

    #[test]
    fn test_load_validated_rejects_relative_source() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{ "MEDIA_MERGE": { "user": "media", "group": "media",
                 "quality_tags": ["hd"],
                 "types": { "tv": { "source_paths": ["tv-hd"],
                                    "merged_path": "/media/tv" } } } }"#,
        )
        .unwrap();

        let err = load_validated(Some(&path)).unwrap_err();
        assert!(matches!(err, CliError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_validated_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_validated(Some(&temp.path().join("none.json"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
