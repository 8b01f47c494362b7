//! HTTP client wrapper for fetching images and album pages.
//!
//! This module provides the `HttpClient` struct: one pooled `reqwest::Client`
//! with a fixed request timeout, plus helpers to stream a body to disk.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::REQUEST_TIMEOUT_SECS;
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client shared by the page walker and every download task.
///
/// Cloning is cheap: clones share the same connection pool.
///
/// # Example
///
/// ```no_run
/// use album_dl_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let response = client.get("https://example.com/photo.jpg").await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default 30 second request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with a custom total request timeout.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    #[instrument(level = "debug")]
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent::default_user_agent())
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Issues a GET request and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if `url` is not an absolute http(s) URL
    /// - [`DownloadError::Timeout`] if no response arrived in time
    /// - [`DownloadError::Network`] for any other transport failure
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response, DownloadError> {
        let parsed = parse_http_url(url)?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        debug!(status = response.status().as_u16(), "response received");
        Ok(response)
    }

    /// Fetches a page body as text, treating any non-200 status as an error.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus [`DownloadError::HttpStatus`] for a non-200 status.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String, DownloadError> {
        let response = self.get(url).await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(DownloadError::http_status(url, status));
        }
        response
            .text()
            .await
            .map_err(|e| DownloadError::network(url, e))
    }
}

/// Streams a response body to `file_path`, truncating any existing file.
///
/// Returns the number of bytes written. A failure part way through leaves a
/// truncated file behind.
///
/// # Errors
///
/// [`DownloadError::Io`] for file errors, [`DownloadError::Network`] or
/// [`DownloadError::Timeout`] if the body stream breaks.
#[instrument(level = "debug", skip(response), fields(path = %file_path.display()))]
pub async fn save_body(
    response: Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    debug!(bytes_written, "body saved");
    Ok(bytes_written)
}

fn parse_http_url(url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(DownloadError::invalid_url(url)),
    }
}
