//! Quality-tiered media merge.
//!
//! Several source trees hold copies of the same titles at different quality
//! tiers. This module links the best available copy of every title into one
//! merged tree and keeps that tree in sync as sources change.
//!
//! # Overview
//!
//! ```text
//! /media/tv-uhd/show_a/ep1-uhd.mkv ─┐
//! /media/tv-hd/show_a/ep1-hd.mkv    │ (show_a already claimed by tv-uhd)
//! /media/tv-hd/show_b/ep1-hd.mkv ─┐ │
//!                                 │ │
//!                                 ▼ ▼
//!                  /media/tv-merged/show_a/ep1-uhd.mkv   (hard link)
//!                  /media/tv-merged/show_b/ep1-hd.mkv    (hard link)
//! ```
//!
//! # Pipeline
//!
//! For every media type, in name order:
//!
//! 1. [`MergePlanner`] picks, per item, the first source path that has it and
//!    lists the links the merged tree must contain.
//! 2. [`LinkSynchronizer`] provisions item directories and relinks every file.
//! 3. [`ReconciliationSweep`] removes files outside the plan and the
//!    directories they leave empty.
//!
//! [`MergeOrchestrator`] chains the three and stops at the first fatal error.
//! Changes already applied are kept; running the merge again converges.
//!
//! # Priority
//!
//! The order of a type's `source_paths` is the priority order. The quality tag
//! vocabulary only decides which tag a path carries.

mod error;
mod orchestrator;
mod ownership;
mod planner;
mod quality;
mod sweep;
mod sync;

pub use error::{IdentityKind, MergeError, MergeResult, MergeWarning};
pub use orchestrator::{run_merge, MergeOrchestrator, MergeSummary, TypeSummary};
pub use ownership::{Ownership, DIRECTORY_MODE};
pub use planner::{ClaimedItem, LinkTarget, MergePlan, MergePlanner, PlanOutcome};
pub use quality::QualityTagger;
pub use sweep::{ReconciliationSweep, SweepReport};
pub use sync::{LinkSynchronizer, SyncReport};
