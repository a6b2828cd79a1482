//! Retrieval of single remote resources over HTTPS.
//!
//! Only the self-update script travels through here; repository snapshots use
//! the git transport in [`crate::git`]. A fetch either yields the complete body
//! or a [`FetchError`] describing why it did not; partial bodies are never
//! returned.

use crate::constants::USER_AGENT;
use crate::core::FetchError;
use std::time::Duration;

/// A fetched resource. Lives only for a single fetch-and-consume operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    /// Where the bytes came from
    pub url: String,
    /// Complete response body
    pub bytes: Vec<u8>,
}

/// Source of remote resources.
///
/// Lifecycle code depends on this trait rather than on [`HttpFetcher`] so it can
/// run against an in-memory fetcher in tests.
#[allow(async_fn_in_trait)]
pub trait RemoteFetcher {
    /// Fetch the full body at `url`.
    async fn fetch(&self, url: &str) -> Result<RemoteResource, FetchError>;
}

/// [`RemoteFetcher`] backed by `reqwest`, HTTPS only.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher whose requests, body included, must finish within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be initialized
    /// (for example when no TLS backend is available).
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client {
                reason: error_chain(&e),
            })?;
        Ok(Self {
            client,
            timeout,
        })
    }

    fn classify(&self, url: &str, error: &reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: error_chain(error),
            }
        }
    }
}

impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RemoteResource, FetchError> {
        let parsed = validate_https_url(url)?;
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(parsed).send().await.map_err(|e| self.classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Fetch of {} returned HTTP {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(url, &e))?;
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);

        Ok(RemoteResource {
            url: url.to_string(),
            bytes: bytes.to_vec(),
        })
    }
}

/// Parse `url` and require an `https` scheme with a host.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] if the URL is malformed, not HTTPS, or has no host.
pub fn validate_https_url(url: &str) -> Result<reqwest::Url, FetchError> {
    let invalid = |reason: &str| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = reqwest::Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(invalid("only https URLs are fetched"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(parsed)
}

// reqwest keeps the useful part (connection refused, dns failure) in the source chain
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
