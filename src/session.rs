//! Authenticated HTTP session shared by every network operation.
//!
//! The session wraps a single `reqwest::Client` built once from the caller's
//! cookie jar. It is read-only after construction; all requests in a run go
//! through it sequentially.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::cookie::Jar;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::urls::absolutize_url;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

fn default_user_agent() -> String {
    format!("coursedump/{}", env!("CARGO_PKG_VERSION"))
}

/// Errors that can occur while fetching a page through the session.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }
}

/// A fetched HTML page together with the URL the request ended up at
/// after redirect following.
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub final_url: Url,
    /// Response body text.
    pub body: String,
}

/// Authenticated HTTP session for a single LMS instance.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: Url,
}

impl Session {
    /// Builds the session client with the given cookie jar attached.
    ///
    /// Configuration follows the download-oriented defaults: 30 s connect
    /// timeout, 5 min read timeout, gzip decompression, an identifying
    /// User-Agent, and redirect following.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the client cannot be constructed.
    pub fn new(base_url: Url, cookie_jar: Arc<Jar>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(default_user_agent())
            .cookie_provider(cookie_jar)
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        Ok(Self { client, base_url })
    }

    /// Returns the LMS base URL this session is bound to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Resolves a possibly relative href against the session base URL.
    #[must_use]
    pub fn absolutize(&self, href: &str) -> Option<String> {
        absolutize_url(href, &self.base_url)
    }

    /// Fetches a page with redirect following, returning the final URL and body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, or a non-success
    /// HTTP status.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_html(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        Ok(FetchedPage { final_url, body })
    }
}
