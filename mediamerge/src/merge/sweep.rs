//! Orphan and empty-directory cleanup for a merged tree.
//!
//! Cleanup is best effort: removal failures are logged and returned as
//! warnings, never as errors. Traversal uses an explicit work list, so deep
//! trees do not grow the call stack.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::MergeWarning;

/// Result of one sweep over a merged tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files removed because they are not in the plan.
    pub files_removed: usize,
    /// Directories removed because they were empty.
    pub directories_removed: usize,
    /// Removal failures and unreadable parts of the tree.
    pub warnings: Vec<MergeWarning>,
}

/// Removes everything from a merged tree that the current plan does not expect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationSweep;

impl ReconciliationSweep {
    pub fn new() -> Self {
        Self
    }

    /// Sweep `merged_path` against the expected-file set.
    ///
    /// Every non-directory entry not in `expected` is removed, then every
    /// directory below the root that ended up empty, deepest first. The root
    /// itself is kept.
    pub fn sweep(&self, merged_path: &Path, expected: &HashSet<PathBuf>) -> SweepReport {
        let mut report = SweepReport::default();

        let (files, directories) = walk(merged_path, &mut report.warnings);

        for file in files.iter().filter(|f| !expected.contains(*f)) {
            match fs::remove_file(file) {
                Ok(()) => {
                    tracing::debug!(path = %file.display(), "Removed orphan");
                    report.files_removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "Failed to remove orphan");
                    report.warnings.push(MergeWarning::OrphanRemoveFailed {
                        path: file.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Pre-order walk reversed: children always come before their parent.
        for dir in directories.iter().rev() {
            if !is_empty_dir(dir) {
                continue;
            }
            match fs::remove_dir(dir) {
                Ok(()) => {
                    tracing::debug!(path = %dir.display(), "Removed empty directory");
                    report.directories_removed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "Failed to remove empty directory"
                    );
                    report.warnings.push(MergeWarning::EmptyDirRemoveFailed {
                        path: dir.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Collect non-directory entries and directories (pre-order) below `root`.
///
/// Symlinks are reported as files and never followed. Entries that cannot be
/// read or stat'ed are skipped and reported as [`MergeWarning::ScanFailed`];
/// entries that vanished meanwhile are skipped silently.
fn walk(root: &Path, warnings: &mut Vec<MergeWarning>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut directories = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    let mut scan_failed = |path: &Path, e: io::Error| {
        if e.kind() == io::ErrorKind::NotFound {
            return;
        }
        tracing::warn!(path = %path.display(), error = %e, "Failed to scan merged tree");
        warnings.push(MergeWarning::ScanFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
    };

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                scan_failed(&dir, e);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    scan_failed(&dir, e);
                    continue;
                }
            };
            let path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => {
                    directories.push(path.clone());
                    pending.push(path);
                }
                Ok(_) => files.push(path),
                Err(e) => scan_failed(&path, e),
            }
        }
    }

    (files, directories)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_sweep_removes_orphans_and_keeps_expected() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("show/keep-hd.mkv"));
        touch(&root.join("show/old-uhd.mkv"));
        touch(&root.join("gone/ep-hd.mkv"));

        let expected: HashSet<PathBuf> = [root.join("show/keep-hd.mkv")].into_iter().collect();
        let report = ReconciliationSweep::new().sweep(root, &expected);

        assert_eq!(report.files_removed, 2);
        assert_eq!(report.directories_removed, 1);
        assert!(report.warnings.is_empty());
        assert!(root.join("show/keep-hd.mkv").exists());
        assert!(!root.join("show/old-uhd.mkv").exists());
        assert!(!root.join("gone").exists());
    }

    #[test]
    fn test_sweep_removes_nested_empty_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b/c/d")).unwrap();
        touch(&root.join("a/b/c/d/e.mkv"));

        let report = ReconciliationSweep::new().sweep(root, &HashSet::new());

        assert_eq!(report.files_removed, 1);
        assert_eq!(report.directories_removed, 4);
        assert!(root.exists());
        assert_eq!(fs::read_dir(root).unwrap().count(), 0);
    }

    #[test]
    fn test_sweep_keeps_root() {
        let temp = TempDir::new().unwrap();
        let report = ReconciliationSweep::new().sweep(temp.path(), &HashSet::new());
        assert_eq!(report, SweepReport::default());
        assert!(temp.path().exists());
    }

    #[test]
    fn test_sweep_removes_symlinks_without_following() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        let root = temp.path().join("merged");
        touch(&outside.join("precious.mkv"));
        fs::create_dir_all(root.join("show")).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("show/link")).unwrap();

        let report = ReconciliationSweep::new().sweep(&root, &HashSet::new());

        assert_eq!(report.files_removed, 1);
        assert!(outside.join("precious.mkv").exists());
        assert!(!root.join("show").exists());
    }

    #[test]
    fn test_sweep_missing_root_is_noop() {
        let temp = TempDir::new().unwrap();
        let report =
            ReconciliationSweep::new().sweep(&temp.path().join("absent"), &HashSet::new());
        assert_eq!(report.files_removed, 0);
        assert_eq!(report.directories_removed, 0);
    }

    #[test]
    fn test_sweep_deep_tree() {
        let temp = TempDir::new().unwrap();
        let mut deep = temp.path().to_path_buf();
        for _ in 0..200 {
            deep.push("d");
        }
        fs::create_dir_all(&deep).unwrap();

        let report = ReconciliationSweep::new().sweep(temp.path(), &HashSet::new());

        assert_eq!(report.directories_removed, 200);
        assert!(!temp.path().join("d").exists());
    }

    fn running_as_root() -> bool {
        // SAFETY: geteuid cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    #[test]
    fn test_sweep_reports_removal_failures_and_continues() {
        use std::os::unix::fs::PermissionsExt;

        if running_as_root() {
            // Permission bits do not stop root.
            return;
        }

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("locked/stale-hd.mkv"));
        fs::create_dir_all(root.join("locked/empty")).unwrap();
        touch(&root.join("open/stale-hd.mkv"));
        fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o555)).unwrap();

        let report = ReconciliationSweep::new().sweep(root, &HashSet::new());

        fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();

        assert!(report.warnings.iter().any(|w| matches!(
            w,
            MergeWarning::OrphanRemoveFailed { path, .. } if path == &root.join("locked/stale-hd.mkv")
        )));
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            MergeWarning::EmptyDirRemoveFailed { path, .. } if path == &root.join("locked/empty")
        )));
        assert_eq!(report.files_removed, 1);
        assert!(!root.join("open").exists());
    }

    #[test]
    fn test_sweep_reports_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        if running_as_root() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("hidden/stale-hd.mkv"));
        touch(&root.join("open/stale-hd.mkv"));
        fs::set_permissions(root.join("hidden"), fs::Permissions::from_mode(0o000)).unwrap();

        let report = ReconciliationSweep::new().sweep(root, &HashSet::new());

        fs::set_permissions(root.join("hidden"), fs::Permissions::from_mode(0o755)).unwrap();

        assert!(report.warnings.iter().any(|w| matches!(
            w,
            MergeWarning::ScanFailed { path, .. } if path == &root.join("hidden")
        )));
        assert_eq!(report.files_removed, 1);
        assert!(root.join("hidden/stale-hd.mkv").exists());
    }

    #[test]
    fn test_sweep_missing_root_has_no_warnings() {
        let temp = TempDir::new().unwrap();
        let report =
            ReconciliationSweep::new().sweep(&temp.path().join("absent"), &HashSet::new());
        assert!(report.warnings.is_empty());
    }
}
