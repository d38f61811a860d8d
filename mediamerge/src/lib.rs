//! MediaMerge - quality-tiered media library merging
//!
//! Links the best available copy of every title from several quality-tiered
//! source trees (HD, UHD, 4K, ...) into one merged tree per media type, using
//! hard links so no data is duplicated.
//!
//! - [`merge`] plans, links and sweeps the merged trees
//! - [`config`] loads the JSON configuration file
//! - [`notify`] asks a media server to rescan after a merge
//! - [`logging`] installs the `tracing` subscriber

pub mod config;
pub mod logging;
pub mod merge;
pub mod notify;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
