//! In-memory merge configuration and its runtime validation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::merge::{MergeError, MergeResult};

/// Default timeout for rescan requests, in seconds.
pub const DEFAULT_RESCAN_TIMEOUT_SECS: u64 = 10;

/// Everything a merge run needs.
///
/// Media types are kept in a `BTreeMap`, so a run processes them in name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Owner applied to directories created in merged trees.
    pub user: String,

    /// Group applied to directories created in merged trees.
    pub group: String,

    /// Quality tag vocabulary, in matching order.
    ///
    /// Which source wins an item is decided by `TypeConfig::source_paths`
    /// order, not by this list.
    pub quality_tags: Vec<String>,

    /// Per media type settings, keyed by type name (`tv`, `movies`, ...).
    #[serde(default)]
    pub types: BTreeMap<String, TypeConfig>,

    /// Optional media server to ask for a rescan after a successful merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescan: Option<RescanConfig>,
}

/// Sources and destination for one media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConfig {
    /// Source trees, highest priority first.
    pub source_paths: Vec<PathBuf>,

    /// Root of the merged tree.
    pub merged_path: PathBuf,
}

/// Where and how to send the post-merge rescan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescanConfig {
    /// Full URL to POST to.
    pub url: String,

    /// Extra request headers (API tokens and the like).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request timeout in seconds.
    #[serde(default = "default_rescan_timeout")]
    pub timeout_secs: u64,
}

fn default_rescan_timeout() -> u64 {
    DEFAULT_RESCAN_TIMEOUT_SECS
}

impl TypeConfig {
    /// Create a type config from sources (priority order) and a merged path.
    pub fn new<I, P>(source_paths: I, merged_path: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            source_paths: source_paths.into_iter().map(Into::into).collect(),
            merged_path: merged_path.into(),
        }
    }
}

impl RescanConfig {
    /// Create a rescan config for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_RESCAN_TIMEOUT_SECS,
        }
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl MergeConfig {
    /// Create a config with no media types.
    pub fn new<I, S>(user: impl Into<String>, group: impl Into<String>, quality_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user: user.into(),
            group: group.into(),
            quality_tags: quality_tags.into_iter().map(Into::into).collect(),
            types: BTreeMap::new(),
            rescan: None,
        }
    }

    /// Add or replace a media type.
    pub fn with_type(mut self, name: impl Into<String>, type_config: TypeConfig) -> Self {
        self.types.insert(name.into(), type_config);
        self
    }

    /// Set the rescan target.
    pub fn with_rescan(mut self, rescan: RescanConfig) -> Self {
        self.rescan = Some(rescan);
        self
    }

    /// Check the invariants a merge relies on.
    ///
    /// Runs before any filesystem mutation.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidConfiguration`] describing the first problem found.
    pub fn validate(&self) -> MergeResult<()> {
        if self.user.trim().is_empty() {
            return Err(invalid("user must not be empty"));
        }
        if self.group.trim().is_empty() {
            return Err(invalid("group must not be empty"));
        }
        if self.quality_tags.is_empty() {
            return Err(invalid("quality_tags must not be empty"));
        }
        if let Some(tag) = self
            .quality_tags
            .iter()
            .find(|t| t.is_empty() || t.contains('/'))
        {
            return Err(invalid(format!("invalid quality tag '{}'", tag)));
        }

        for (name, type_config) in &self.types {
            type_config
                .validate()
                .map_err(|reason| invalid(format!("type '{}': {}", name, reason)))?;
        }

        if let Some(rescan) = &self.rescan {
            if rescan.url.trim().is_empty() {
                return Err(invalid("rescan.url must not be empty"));
            }
        }

        Ok(())
    }
}

impl TypeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.source_paths.is_empty() {
            return Err("source_paths must not be empty".to_string());
        }
        if let Some(path) = self.source_paths.iter().find(|p| !p.is_absolute()) {
            return Err(format!("source path is not absolute: {}", path.display()));
        }
        if !self.merged_path.is_absolute() {
            return Err(format!(
                "merged path is not absolute: {}",
                self.merged_path.display()
            ));
        }
        if let Some(source) = self.source_paths.iter().find(|source| {
            self.merged_path.starts_with(source) || source.starts_with(&self.merged_path)
        }) {
            return Err(format!(
                "merged path {} overlaps source path {}",
                self.merged_path.display(),
                source.display()
            ));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> MergeError {
    MergeError::InvalidConfiguration(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> MergeConfig {
        MergeConfig::new("media", "media", ["uhd", "hd"]).with_type(
            "tv",
            TypeConfig::new(["/media/tv-uhd", "/media/tv-hd"], "/media/tv-merged"),
        )
    }

    fn assert_invalid(config: &MergeConfig, needle: &str) {
        match config.validate() {
            Err(MergeError::InvalidConfiguration(msg)) => {
                assert!(msg.contains(needle), "'{}' should mention '{}'", msg, needle)
            }
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_without_types_is_valid() {
        let config = MergeConfig::new("media", "media", ["hd"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relative_source_path_rejected() {
        let config = valid_config().with_type(
            "movies",
            TypeConfig::new(["movies-hd"], "/media/movies-merged"),
        );
        assert_invalid(&config, "type 'movies': source path is not absolute");
    }

    #[test]
    fn test_relative_merged_path_rejected() {
        let config =
            valid_config().with_type("tv", TypeConfig::new(["/media/tv-hd"], "tv-merged"));
        assert_invalid(&config, "merged path is not absolute");
    }

    #[test]
    fn test_empty_source_list_rejected() {
        let config = valid_config().with_type(
            "tv",
            TypeConfig::new(Vec::<PathBuf>::new(), "/media/tv-merged"),
        );
        assert_invalid(&config, "source_paths must not be empty");
    }

    #[test]
    fn test_merged_path_as_source_rejected() {
        let config = valid_config().with_type(
            "tv",
            TypeConfig::new(["/media/tv-hd", "/media/tv-merged"], "/media/tv-merged"),
        );
        assert_invalid(&config, "overlaps source path /media/tv-merged");
    }

    #[test]
    fn test_merged_path_inside_source_rejected() {
        let config = valid_config().with_type(
            "tv",
            TypeConfig::new(["/media/tv-uhd", "/media/tv-hd"], "/media/tv-hd/merged"),
        );
        assert_invalid(&config, "overlaps source path /media/tv-hd");
    }

    #[test]
    fn test_source_inside_merged_path_rejected() {
        let config = valid_config().with_type(
            "tv",
            TypeConfig::new(["/media/tv/uhd"], "/media/tv"),
        );
        assert_invalid(&config, "overlaps source path /media/tv/uhd");
    }

    #[test]
    fn test_sibling_with_common_prefix_allowed() {
        let config = valid_config().with_type(
            "tv",
            TypeConfig::new(["/media/tv-hd"], "/media/tv-hd-merged"),
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_identity_rejected() {
        let mut config = valid_config();
        config.user = " ".to_string();
        assert_invalid(&config, "user");

        let mut config = valid_config();
        config.group = String::new();
        assert_invalid(&config, "group");
    }

    #[test]
    fn test_bad_quality_tags_rejected() {
        let mut config = valid_config();
        config.quality_tags.clear();
        assert_invalid(&config, "quality_tags");

        let mut config = valid_config();
        config.quality_tags.push(String::new());
        assert_invalid(&config, "invalid quality tag");
    }

    #[test]
    fn test_rescan_builder_and_validation() {
        let rescan = RescanConfig::new("http://jellyfin:8096/Library/Refresh")
            .with_header("X-Emby-Token", "secret")
            .with_timeout_secs(3);
        assert_eq!(rescan.timeout_secs, 3);
        assert_eq!(rescan.headers.get("X-Emby-Token").unwrap(), "secret");
        assert!(valid_config().with_rescan(rescan).validate().is_ok());

        let config = valid_config().with_rescan(RescanConfig::new(""));
        assert_invalid(&config, "rescan.url");
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "user": "media",
            "group": "media",
            "quality_tags": ["hd"],
            "rescan": { "url": "http://plex:32400/library/sections/all/refresh" }
        }"#;
        let config: MergeConfig = serde_json::from_str(json).unwrap();
        assert!(config.types.is_empty());
        let rescan = config.rescan.unwrap();
        assert_eq!(rescan.timeout_secs, DEFAULT_RESCAN_TIMEOUT_SECS);
        assert!(rescan.headers.is_empty());
    }
}
