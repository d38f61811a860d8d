//! Materializes a [`MergePlan`] as hard links.

use std::fs;
use std::io;
use std::path::Path;

use super::error::{MergeError, MergeResult};
use super::ownership::Ownership;
use super::planner::{LinkTarget, MergePlan};

/// Counts from one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Item directories provisioned.
    pub directories_provisioned: usize,
    /// Hard links (re)created.
    pub files_linked: usize,
    /// Existing entries removed before relinking.
    pub files_replaced: usize,
}

/// Creates item directories and hard links for a plan.
#[derive(Debug, Clone, Copy)]
pub struct LinkSynchronizer {
    ownership: Ownership,
}

impl LinkSynchronizer {
    pub fn new(ownership: Ownership) -> Self {
        Self { ownership }
    }

    /// Apply a plan to the merged tree.
    ///
    /// Every destination is removed and relinked, even one that already points
    /// at the right inode. The first failing link aborts the pass.
    pub fn sync(&self, plan: &MergePlan) -> MergeResult<SyncReport> {
        let mut report = SyncReport::default();

        for directory in plan.directories() {
            self.ownership.ensure_directory(directory)?;
            report.directories_provisioned += 1;
        }

        for link in plan.links() {
            if replace_link(link)? {
                report.files_replaced += 1;
            }
            report.files_linked += 1;
        }

        tracing::debug!(
            merged = %plan.merged_path().display(),
            directories = report.directories_provisioned,
            linked = report.files_linked,
            replaced = report.files_replaced,
            "Synchronized links"
        );

        Ok(report)
    }
}

/// Remove whatever sits at the destination, then hard-link the source there.
///
/// Returns whether something had to be removed first.
fn replace_link(link: &LinkTarget) -> MergeResult<bool> {
    let replaced = remove_existing(&link.destination)?;

    fs::hard_link(&link.source, &link.destination).map_err(|e| MergeError::LinkCreateFailed {
        from: link.source.clone(),
        to: link.destination.clone(),
        source: e,
    })?;

    tracing::trace!(
        source = %link.source.display(),
        destination = %link.destination.display(),
        "Linked"
    );
    Ok(replaced)
}

fn remove_existing(path: &Path) -> MergeResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MergeError::LinkReplaceFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
