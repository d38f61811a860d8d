//! Priority-based selection of logical items.
//!
//! The planner walks a media type's source paths in configured order. The
//! first source whose item directory (an immediate subdirectory) holds at
//! least one file claims the item, and every file of that one directory
//! becomes a link target. An item directory without files claims nothing.
//! Later sources never contribute files to a claimed item, even files the
//! winning source lacks.
//!
//! ```text
//! tv-uhd/show_a/ep1-uhd.mkv  ──claim──►  tv-merged/show_a/ep1-uhd.mkv
//! tv-hd/show_a/ep1-hd.mkv        (skipped: show_a already claimed)
//! tv-hd/show_b/ep1-hd.mkv    ──claim──►  tv-merged/show_b/ep1-hd.mkv
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::TypeConfig;

use super::error::{MergeError, MergeResult, MergeWarning};
use super::ownership::Ownership;
use super::quality::QualityTagger;

/// One hard link the merged tree must contain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LinkTarget {
    /// File in the winning source tree.
    pub source: PathBuf,
    /// Path in the merged tree.
    pub destination: PathBuf,
}

/// A logical item and the source that won it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedItem {
    /// Directory name, shared across source and merged trees.
    pub name: String,
    /// Source root the item was taken from.
    pub source_root: PathBuf,
    /// Quality tag of that source root.
    pub tag: String,
    /// Item directory in the merged tree.
    pub directory: PathBuf,
    /// Files to link, sorted by destination.
    pub links: Vec<LinkTarget>,
}

/// Expected state of one media type's merged tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    merged_path: PathBuf,
    items: BTreeMap<String, ClaimedItem>,
}

impl MergePlan {
    /// An empty plan for the given merged root.
    pub fn new(merged_path: impl Into<PathBuf>) -> Self {
        Self {
            merged_path: merged_path.into(),
            items: BTreeMap::new(),
        }
    }

    /// Root of the merged tree.
    pub fn merged_path(&self) -> &Path {
        &self.merged_path
    }

    /// Claimed items, by name.
    pub fn items(&self) -> impl Iterator<Item = &ClaimedItem> {
        self.items.values()
    }

    /// Look up a claimed item.
    pub fn item(&self, name: &str) -> Option<&ClaimedItem> {
        self.items.get(name)
    }

    /// Whether an item has been claimed.
    pub fn is_claimed(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Number of claimed items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Directories the synchronizer must provision.
    pub fn directories(&self) -> BTreeSet<&Path> {
        self.items.values().map(|i| i.directory.as_path()).collect()
    }

    /// All link targets across items.
    pub fn links(&self) -> impl Iterator<Item = &LinkTarget> {
        self.items.values().flat_map(|i| i.links.iter())
    }

    /// Number of link targets.
    pub fn link_count(&self) -> usize {
        self.items.values().map(|i| i.links.len()).sum()
    }

    /// The complete expected-file set of the merged tree.
    pub fn expected_files(&self) -> HashSet<PathBuf> {
        self.links().map(|l| l.destination.clone()).collect()
    }

    fn claim(&mut self, item: ClaimedItem) {
        self.items.insert(item.name.clone(), item);
    }
}

/// Plan plus the non-fatal conditions met while building it.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: MergePlan,
    pub warnings: Vec<MergeWarning>,
}

/// Builds a [`MergePlan`] for one media type.
#[derive(Debug, Clone, Copy)]
pub struct MergePlanner<'a> {
    tagger: &'a QualityTagger,
    ownership: Ownership,
}

impl<'a> MergePlanner<'a> {
    pub fn new(tagger: &'a QualityTagger, ownership: Ownership) -> Self {
        Self { tagger, ownership }
    }

    /// Plan a media type.
    ///
    /// Provisions the merged root, then scans sources in priority order.
    /// Untagged and missing sources are skipped with a warning. Failing to
    /// read a source that does exist is fatal.
    pub fn plan(&self, type_config: &TypeConfig) -> MergeResult<PlanOutcome> {
        let merged_path = &type_config.merged_path;
        self.ownership.ensure_directory(merged_path)?;

        let mut plan = MergePlan::new(merged_path);
        let mut warnings = Vec::new();

        for source_root in &type_config.source_paths {
            let Some(tag) = self.tagger.tag_of(source_root) else {
                tracing::warn!(
                    source = %source_root.display(),
                    tags = ?self.tagger.tags(),
                    "Source path has no quality tag, skipping"
                );
                warnings.push(MergeWarning::UntaggedSource {
                    path: source_root.clone(),
                });
                continue;
            };

            if !source_root.exists() {
                tracing::warn!(
                    source = %source_root.display(),
                    "Source path does not exist, skipping"
                );
                warnings.push(MergeWarning::SourceUnavailable {
                    path: source_root.clone(),
                });
                continue;
            }

            let claimed_before = plan.item_count();
            for (name, item_path) in list_entries(source_root, EntryKind::Directory)? {
                if plan.is_claimed(&name) {
                    tracing::trace!(
                        item = %name,
                        source = %source_root.display(),
                        "Item already claimed by higher priority source"
                    );
                    continue;
                }

                let item = self.claim_item(&name, &item_path, source_root, tag, merged_path)?;
                if item.links.is_empty() {
                    tracing::debug!(
                        item = %name,
                        source = %source_root.display(),
                        "Item has no files, leaving it to lower priority sources"
                    );
                    continue;
                }
                plan.claim(item);
            }

            tracing::debug!(
                source = %source_root.display(),
                tag,
                claimed = plan.item_count() - claimed_before,
                "Scanned source path"
            );
        }

        Ok(PlanOutcome { plan, warnings })
    }

    fn claim_item(
        &self,
        name: &str,
        item_path: &Path,
        source_root: &Path,
        tag: &str,
        merged_path: &Path,
    ) -> MergeResult<ClaimedItem> {
        let directory = merged_path.join(name);
        let mut links: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

        for (file_name, file_path) in list_entries(item_path, EntryKind::File)? {
            let destination = directory.join(self.tagger.merged_name(&file_name, tag));
            if let Some(existing) = links.get(&destination) {
                tracing::warn!(
                    kept = %existing.display(),
                    ignored = %file_path.display(),
                    destination = %destination.display(),
                    "Two files map to the same merged name, keeping the first"
                );
                continue;
            }
            links.insert(destination, file_path);
        }

        Ok(ClaimedItem {
            name: name.to_string(),
            source_root: source_root.to_path_buf(),
            tag: tag.to_string(),
            directory,
            links: links
                .into_iter()
                .map(|(destination, source)| LinkTarget {
                    source,
                    destination,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

/// Immediate entries of `dir` of the given kind, sorted by name.
///
/// Symlinks are followed when deciding the kind. Names that are not valid
/// UTF-8 are skipped since they cannot be retagged.
fn list_entries(dir: &Path, kind: EntryKind) -> MergeResult<Vec<(String, PathBuf)>> {
    let read_failed = |e: std::io::Error| MergeError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let path = entry.path();

        let matches = match kind {
            EntryKind::Directory => path.is_dir(),
            EntryKind::File => path.is_file(),
        };
        if !matches {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => entries.push((name, path)),
            Err(raw) => {
                tracing::warn!(name = ?raw, dir = %dir.display(), "Skipping non UTF-8 name");
            }
        }
    }

    entries.sort();
    Ok(entries)
}
