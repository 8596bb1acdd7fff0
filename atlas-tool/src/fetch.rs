//! HTTP document fetcher.

use async_trait::async_trait;
use atlas_core::{AtlasError, FetchConfig, Fetcher, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::artifact::ArtifactStore;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// Downloads pages with a desktop browser user agent.
///
/// Non-2xx responses, timeouts and connection errors are all [`AtlasError::Fetch`]; nothing
/// is retried. When an [`ArtifactStore`] is attached, each successful body is also written to
/// `raw_html/`.
pub struct HttpFetcher {
    client: reqwest::Client,
    artifacts: Option<ArtifactStore>,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`AtlasError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| AtlasError::Config(format!("failed to build fetch client: {e}")))?;

        Ok(Self { client, artifacts: None })
    }

    /// Persist every fetched body through `artifacts`.
    pub fn with_artifacts(mut self, artifacts: ArtifactStore) -> Self {
        self.artifacts = Some(artifacts);
        self
    }
}

fn fetch_error(url: &str, message: impl Into<String>) -> AtlasError {
    AtlasError::Fetch { url: url.to_string(), message: message.into() }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "fetch failed");
            let message = if e.is_timeout() { format!("timed out: {e}") } else { e.to_string() };
            fetch_error(url, message)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "fetch returned an error status");
            return Err(fetch_error(url, format!("HTTP {status}")));
        }

        let body =
            response.text().await.map_err(|e| fetch_error(url, format!("failed to read body: {e}")))?;
        debug!(body_len = body.len(), "fetched document");

        if let Some(artifacts) = &self.artifacts {
            artifacts.save_raw(url, &body);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        assert!(HttpFetcher::new(&FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let config = FetchConfig { timeout_secs: 2, ..Default::default() };
        let fetcher = HttpFetcher::new(&config).unwrap();
        // Port 9 on localhost (discard) is closed on test machines.
        let err = fetcher.fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, AtlasError::Fetch { ref url, .. } if url == "http://127.0.0.1:9/"));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn invalid_url_is_a_fetch_error() {
        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, AtlasError::Fetch { .. }));
    }
}
