//! Rescan notification over HTTP.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::RescanConfig;
use crate::merge::MergeSummary;

use super::{NotifyError, RescanNotifier};

/// Sends a POST to a media server's library refresh endpoint.
///
/// Works with any server that rescans on a plain POST, e.g. Jellyfin's
/// `/Library/Refresh` with an `X-Emby-Token` header, or Plex's section refresh
/// URL with the token in the query string.
pub struct HttpRescanNotifier {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpRescanNotifier {
    /// Build a notifier from the rescan section of the configuration.
    pub fn new(config: &RescanConfig) -> Result<Self, NotifyError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                NotifyError::InvalidConfig(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                NotifyError::InvalidConfig(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                NotifyError::InvalidConfig(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RescanNotifier for HttpRescanNotifier {
    fn notify(&self, summary: &MergeSummary) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .send()
            .map_err(|e| NotifyError::Request {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        tracing::info!(
            url = %self.url,
            status = status.as_u16(),
            types = summary.types.len(),
            "Requested media server rescan"
        );
        Ok(())
    }
}
