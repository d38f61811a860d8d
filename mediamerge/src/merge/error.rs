//! Error and warning types for merge runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Fatal errors that abort a merge run.
#[derive(Debug)]
pub enum MergeError {
    /// The configuration is malformed (non-absolute paths, empty source list, ...).
    InvalidConfiguration(String),

    /// A user or group name could not be resolved on this host.
    IdentityNotFound { kind: IdentityKind, name: String },

    /// Failed to create a directory in the merged tree.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to apply ownership or mode to a directory.
    SetOwnershipFailed { path: PathBuf, source: io::Error },

    /// Failed to read a source directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// An existing entry at a link destination could not be removed.
    LinkReplaceFailed { path: PathBuf, source: io::Error },

    /// Creating a hard link failed (cross-device, permissions, ...).
    LinkCreateFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// A media type's pass failed; the remaining types were skipped.
    TypeFailed {
        media_type: String,
        source: Box<MergeError>,
    },
}

/// Which host database an identity lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    User,
    Group,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKind::User => write!(f, "user"),
            IdentityKind::Group => write!(f, "group"),
        }
    }
}

impl MergeError {
    /// The innermost error, unwrapping any [`MergeError::TypeFailed`] layers.
    pub fn root_cause(&self) -> &MergeError {
        match self {
            Self::TypeFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            Self::IdentityNotFound { kind, name } => {
                write!(f, "{} not found: {}", kind, name)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::SetOwnershipFailed { path, source } => {
                write!(
                    f,
                    "failed to set ownership on {}: {}",
                    path.display(),
                    source
                )
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::LinkReplaceFailed { path, source } => {
                write!(
                    f,
                    "failed to remove existing entry {}: {}",
                    path.display(),
                    source
                )
            }
            Self::LinkCreateFailed { from, to, source } => {
                write!(
                    f,
                    "failed to link {} -> {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::TypeFailed { media_type, source } => {
                write!(f, "merge of '{}' failed: {}", media_type, source)
            }
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateDirFailed { source, .. } => Some(source),
            Self::SetOwnershipFailed { source, .. } => Some(source),
            Self::ReadFailed { source, .. } => Some(source),
            Self::LinkReplaceFailed { source, .. } => Some(source),
            Self::LinkCreateFailed { source, .. } => Some(source),
            Self::TypeFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Non-fatal conditions recorded during a merge run.
///
/// These are logged as they happen and returned in the run summary so callers
/// can tell a clean run from one with partial cleanup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// The source path's name carries none of the configured quality tags.
    #[error("source path has no quality tag, skipped: {}", .path.display())]
    UntaggedSource { path: PathBuf },

    /// The source path does not exist.
    #[error("source path does not exist, skipped: {}", .path.display())]
    SourceUnavailable { path: PathBuf },

    /// A file not in the plan could not be removed from the merged tree.
    #[error("failed to remove orphan {}: {reason}", .path.display())]
    OrphanRemoveFailed { path: PathBuf, reason: String },

    /// An empty directory could not be removed from the merged tree.
    #[error("failed to remove empty directory {}: {reason}", .path.display())]
    EmptyDirRemoveFailed { path: PathBuf, reason: String },

    /// Part of the merged tree could not be read, so it was not cleaned.
    #[error("failed to scan {}, left as is: {reason}", .path.display())]
    ScanFailed { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_identity_not_found_display() {
        let err = MergeError::IdentityNotFound {
            kind: IdentityKind::Group,
            name: "media".to_string(),
        };
        assert_eq!(err.to_string(), "group not found: media");
    }

    #[test]
    fn test_link_create_failed_display() {
        let err = MergeError::LinkCreateFailed {
            from: PathBuf::from("/media/tv-hd/show/a-hd.mkv"),
            to: PathBuf::from("/media/tv-merged/show/a-hd.mkv"),
            source: io::Error::new(io::ErrorKind::Other, "cross-device link"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/media/tv-hd/show/a-hd.mkv -> /media/tv-merged/show/a-hd.mkv"));
        assert!(msg.contains("cross-device link"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_type_failed_root_cause() {
        let err = MergeError::TypeFailed {
            media_type: "tv".to_string(),
            source: Box::new(MergeError::InvalidConfiguration("boom".to_string())),
        };
        assert!(err.to_string().starts_with("merge of 'tv' failed"));
        assert!(matches!(
            err.root_cause(),
            MergeError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn test_warning_display() {
        let warning = MergeWarning::OrphanRemoveFailed {
            path: PathBuf::from("/merged/x.mkv"),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "failed to remove orphan /merged/x.mkv: permission denied"
        );
    }
}
