//! Runs plan, sync and sweep for every configured media type.

use std::path::Path;

use serde::Serialize;

use crate::config::{MergeConfig, TypeConfig};

use super::error::{MergeError, MergeResult, MergeWarning};
use super::ownership::Ownership;
use super::planner::MergePlanner;
use super::quality::QualityTagger;
use super::sweep::ReconciliationSweep;
use super::sync::LinkSynchronizer;

/// Outcome of one media type's pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub media_type: String,
    pub items_claimed: usize,
    pub files_linked: usize,
    pub files_removed: usize,
    pub directories_removed: usize,
    #[serde(serialize_with = "serialize_warnings")]
    pub warnings: Vec<MergeWarning>,
}

/// Outcome of a complete merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// One entry per media type, in processing order.
    pub types: Vec<TypeSummary>,
}

impl MergeSummary {
    /// Summary for a media type, if it was processed.
    pub fn get(&self, media_type: &str) -> Option<&TypeSummary> {
        self.types.iter().find(|t| t.media_type == media_type)
    }

    /// All warnings across types.
    pub fn warnings(&self) -> impl Iterator<Item = &MergeWarning> {
        self.types.iter().flat_map(|t| t.warnings.iter())
    }

    /// Whether any non-fatal condition was recorded.
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn total_files_linked(&self) -> usize {
        self.types.iter().map(|t| t.files_linked).sum()
    }
}

fn serialize_warnings<S>(warnings: &[MergeWarning], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(warnings.iter().map(ToString::to_string))
}

/// Drives a merge run over a validated configuration.
///
/// # Example
///
/// ```ignore
/// use mediamerge::config::ConfigFile;
/// use mediamerge::merge::MergeOrchestrator;
///
/// let config = ConfigFile::load_default()?.into_merge_config();
/// let summary = MergeOrchestrator::new(&config).run()?;
/// println!("linked {} files", summary.total_files_linked());
/// ```
#[derive(Debug)]
pub struct MergeOrchestrator<'a> {
    config: &'a MergeConfig,
    tagger: QualityTagger,
}

impl<'a> MergeOrchestrator<'a> {
    pub fn new(config: &'a MergeConfig) -> Self {
        Self {
            config,
            tagger: QualityTagger::new(config.quality_tags.iter().cloned()),
        }
    }

    /// Validate, resolve the configured owner, and merge every media type.
    pub fn run(&self) -> MergeResult<MergeSummary> {
        self.config.validate()?;
        let ownership = Ownership::resolve(&self.config.user, &self.config.group)?;
        self.merge_all(ownership)
    }

    /// Like [`run`](Self::run), but with an already known owner.
    ///
    /// The configured user and group names are not looked up.
    pub fn run_with_ownership(&self, ownership: Ownership) -> MergeResult<MergeSummary> {
        self.config.validate()?;
        self.merge_all(ownership)
    }

    fn merge_all(&self, ownership: Ownership) -> MergeResult<MergeSummary> {
        let mut summary = MergeSummary::default();

        tracing::info!(
            types = self.config.types.len(),
            uid = ownership.uid,
            gid = ownership.gid,
            "Starting merge"
        );

        for (media_type, type_config) in &self.config.types {
            let type_summary = self
                .merge_type(media_type, type_config, ownership)
                .map_err(|e| {
                    tracing::error!(media_type = %media_type, error = %e, "Merge aborted");
                    MergeError::TypeFailed {
                        media_type: media_type.clone(),
                        source: Box::new(e),
                    }
                })?;
            summary.types.push(type_summary);
        }

        tracing::info!(
            types = summary.types.len(),
            linked = summary.total_files_linked(),
            warnings = summary.warnings().count(),
            "Merge completed"
        );
        Ok(summary)
    }

    fn merge_type(
        &self,
        media_type: &str,
        type_config: &TypeConfig,
        ownership: Ownership,
    ) -> MergeResult<TypeSummary> {
        let _span = tracing::info_span!("merge_type", media_type).entered();
        self.log_priority_mismatch(type_config);

        let outcome = MergePlanner::new(&self.tagger, ownership).plan(type_config)?;
        let plan = outcome.plan;

        let sync = LinkSynchronizer::new(ownership).sync(&plan)?;
        let sweep = ReconciliationSweep::new().sweep(plan.merged_path(), &plan.expected_files());

        let mut warnings = outcome.warnings;
        warnings.extend(sweep.warnings);

        tracing::info!(
            merged = %type_config.merged_path.display(),
            items = plan.item_count(),
            linked = sync.files_linked,
            removed_files = sweep.files_removed,
            removed_dirs = sweep.directories_removed,
            "Merged media type"
        );

        Ok(TypeSummary {
            media_type: media_type.to_string(),
            items_claimed: plan.item_count(),
            files_linked: sync.files_linked,
            files_removed: sweep.files_removed,
            directories_removed: sweep.directories_removed,
            warnings,
        })
    }

    /// Note when source order ranks tags differently than the vocabulary does.
    fn log_priority_mismatch(&self, type_config: &TypeConfig) {
        let rank = |path: &Path| {
            self.tagger
                .tag_of(path)
                .and_then(|tag| self.tagger.tags().iter().position(|t| t == tag))
        };
        let ranks: Vec<usize> = type_config
            .source_paths
            .iter()
            .filter_map(|p| rank(p.as_path()))
            .collect();

        if ranks.windows(2).any(|w| w[0] > w[1]) {
            tracing::debug!(
                sources = ?type_config.source_paths,
                tags = ?self.tagger.tags(),
                "Source order differs from quality tag order; source order decides"
            );
        }
    }
}

/// Run a merge with the configured owner.
///
/// Convenience wrapper around [`MergeOrchestrator::run`].
pub fn run_merge(config: &MergeConfig) -> MergeResult<MergeSummary> {
    MergeOrchestrator::new(config).run()
}
