//! The `merge` command.
//!
//! Runs a full merge, prints a per-type summary, then asks the media server to
//! rescan when a `rescan` section is configured.

use std::io::{self, Write};
use std::path::Path;

use mediamerge::merge::{MergeOrchestrator, MergeSummary};
use mediamerge::notify::{HttpRescanNotifier, RescanNotifier};

use super::common::load_validated;
use crate::error::CliError;

/// Run the merge command.
pub fn run(config_path: Option<&Path>, no_notify: bool) -> Result<(), CliError> {
    let config = load_validated(config_path)?.into_merge_config();

    let summary = MergeOrchestrator::new(&config).run()?;

    let mut out = io::stdout().lock();
    print_summary(&summary, &mut out).map_err(|e| CliError::Output(e.to_string()))?;

    match (&config.rescan, no_notify) {
        (Some(_), true) => tracing::info!("Rescan notification skipped (--no-notify)"),
        (Some(rescan), false) => match HttpRescanNotifier::new(rescan) {
            Ok(notifier) => {
                notify_after_merge(&notifier, &summary);
            }
            Err(e) => tracing::warn!(error = %e, "Rescan notification not sent"),
        },
        (None, _) => tracing::debug!("No rescan target configured"),
    }

    Ok(())
}

/// Send the rescan request, logging rather than failing on error.
///
/// Returns whether the notification went through.
fn notify_after_merge(notifier: &dyn RescanNotifier, summary: &MergeSummary) -> bool {
    match notifier.notify(summary) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Rescan notification failed; merge result unaffected");
            false
        }
    }
}

fn print_summary(summary: &MergeSummary, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Merge complete")?;
    writeln!(out, "==============")?;

    for t in &summary.types {
        writeln!(
            out,
            "{:<12} items: {:>5}  linked: {:>6}  removed: {:>5} files, {:>4} dirs",
            t.media_type, t.items_claimed, t.files_linked, t.files_removed, t.directories_removed
        )?;
    }

    if summary.has_warnings() {
        writeln!(out)?;
        writeln!(out, "Warnings:")?;
        for w in summary.warnings() {
            writeln!(out, "  - {}", w)?;
        }
    }

    Ok(())
}
