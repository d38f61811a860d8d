//! Post-merge rescan notification.
//!
//! After a successful merge the media server indexing the merged trees can be
//! asked to rescan. This is a separate side call: its failure is reported on
//! its own and never turns a successful merge into a failed one.

mod http;

pub use http::HttpRescanNotifier;

use thiserror::Error;

use crate::merge::MergeSummary;

/// Errors from a rescan request.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP client could not be built from the configuration.
    #[error("invalid rescan configuration: {0}")]
    InvalidConfig(String),

    /// The request could not be sent or timed out.
    #[error("rescan request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("rescan request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Something that can be told a merge finished.
pub trait RescanNotifier {
    /// Ask the downstream indexer to rescan.
    fn notify(&self, summary: &MergeSummary) -> Result<(), NotifyError>;
}
