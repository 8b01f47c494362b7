//! Error types for task sources.

use thiserror::Error;

use crate::download::DownloadError;

/// Errors that stop a task source from producing further batches.
#[derive(Debug, Error)]
pub enum SourceError {
    /// An album page could not be fetched.
    #[error("failed to fetch page {page} ({url}): {source}")]
    Fetch {
        /// 1-based page number being fetched.
        page: usize,
        /// The page URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: DownloadError,
    },

    /// The start URL is malformed or not http(s).
    #[error("invalid URL '{url}': {reason}\n  Suggestion: Use an absolute http:// or https:// URL")]
    InvalidUrl {
        /// The URL that failed validation.
        url: String,
        /// Why the URL is invalid.
        reason: String,
    },

    /// A CSS selector failed to parse.
    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector {
        /// The selector text.
        selector: String,
        /// Parser message.
        reason: String,
    },
}

impl SourceError {
    /// Creates an `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
