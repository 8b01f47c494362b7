//! Task source over a fixed list of image URLs.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, trace, warn};
use url::Url;

use super::naming::FilenameScheme;
use super::{SourceError, TaskSource};
use crate::download::DownloadTask;

/// Regex pattern for finding URLs in text.
/// Matches http:// and https:// URLs, capturing until whitespace or common delimiters.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'\]]+"#).expect("URL regex is valid") // Static pattern, safe to panic
});

/// Yields every URL found in some text as a single batch.
///
/// ```
/// use album_dl_core::source::{FilenameScheme, UrlListSource};
///
/// let source = UrlListSource::from_text(
///     "https://example.com/a.jpg\nhttps://example.com/b.jpg",
///     "album",
///     FilenameScheme::default(),
/// );
/// assert_eq!(source.len(), 2);
/// ```
#[derive(Debug)]
pub struct UrlListSource {
    pending: Option<Vec<DownloadTask>>,
    skipped: Vec<String>,
}

impl UrlListSource {
    /// Extracts http(s) URLs from `text` and assigns sequential names.
    ///
    /// Candidates that fail validation are skipped and remembered in
    /// [`skipped`](Self::skipped).
    #[tracing::instrument(skip_all, fields(input_len = text.len()))]
    pub fn from_text(text: &str, output_dir: impl AsRef<Path>, mut naming: FilenameScheme) -> Self {
        let output_dir: PathBuf = output_dir.as_ref().to_path_buf();
        let mut tasks = Vec::new();
        let mut skipped = Vec::new();

        for url_match in URL_PATTERN.find_iter(text) {
            let cleaned = clean_url_trailing(url_match.as_str());
            trace!(url = %cleaned, "found URL candidate");
            match validate_url(cleaned) {
                Ok(url) => {
                    tasks.push(DownloadTask::new(url, &output_dir, naming.next_name()));
                }
                Err(e) => {
                    debug!(url = %cleaned, error = %e, "URL validation failed");
                    skipped.push(cleaned.to_string());
                }
            }
        }

        if !skipped.is_empty() {
            warn!(skipped = skipped.len(), "skipped unrecognized URLs");
        }

        Self {
            pending: Some(tasks),
            skipped,
        }
    }

    /// Number of tasks not yet handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.as_ref().map_or(0, Vec::len)
    }

    /// True when no tasks remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidates that were not valid http(s) URLs.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

#[async_trait]
impl TaskSource for UrlListSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<DownloadTask>>, SourceError> {
        Ok(self.pending.take().filter(|tasks| !tasks.is_empty()))
    }
}

/// Strips sentence punctuation captured after a URL, keeping balanced closing
/// brackets (Wikipedia-style paths).
fn clean_url_trailing(url: &str) -> &str {
    let mut result = url;

    while let Some(last) = result.chars().last() {
        match last {
            '.' | ',' | ';' | ':' | '!' | '?' => {
                result = &result[..result.len() - 1];
            }
            ')' | ']' => {
                let open = if last == ')' { '(' } else { '[' };
                let open_count = result.chars().filter(|&c| c == open).count();
                let close_count = result.chars().filter(|&c| c == last).count();
                if close_count > open_count {
                    result = &result[..result.len() - 1];
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    result
}

pub(crate) fn validate_url(raw: &str) -> Result<String, SourceError> {
    let url = Url::parse(raw).map_err(|e| SourceError::invalid_url(raw, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::invalid_url(
            raw,
            format!("scheme '{}' is not supported", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SourceError::invalid_url(raw, "URL has no host"));
    }
    Ok(url.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_extracts_urls_in_order() {
        let source = UrlListSource::from_text(
            "see https://a.example.com/1.jpg and https://b.example.com/2.jpg.",
            "out",
            FilenameScheme::default(),
        );
        let tasks = source.pending.clone().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].source_url(), "https://a.example.com/1.jpg");
        assert_eq!(tasks[0].filename(), "flickr_image_1.jpg");
        assert_eq!(tasks[1].source_url(), "https://b.example.com/2.jpg");
        assert_eq!(tasks[1].filename(), "flickr_image_2.jpg");
        assert_eq!(tasks[1].destination_directory(), Path::new("out"));
    }

    #[test]
    fn test_clean_url_trailing_strips_punctuation() {
        assert_eq!(
            clean_url_trailing("https://example.com/a.jpg,"),
            "https://example.com/a.jpg"
        );
        assert_eq!(
            clean_url_trailing("https://example.com/a.jpg)"),
            "https://example.com/a.jpg"
        );
        assert_eq!(
            clean_url_trailing("https://en.wikipedia.org/wiki/Rust_(language)"),
            "https://en.wikipedia.org/wiki/Rust_(language)"
        );
    }

    #[test]
    fn test_validate_url_rejects_missing_host() {
        assert!(validate_url("http://").is_err());
        assert!(validate_url("https://example.com/x.jpg").is_ok());
    }

    #[test]
    fn test_no_urls_yields_no_batch() {
        let mut source = UrlListSource::from_text("nothing here", "out", FilenameScheme::default());
        assert!(source.is_empty());
        let batch = tokio_test::block_on(source.next_batch()).unwrap();
        assert!(batch.is_none());
    }

    #[tokio::test]
    async fn test_single_batch_then_exhausted() {
        let mut source = UrlListSource::from_text(
            "https://example.com/a.jpg",
            "out",
            FilenameScheme::default(),
        );
        let first = source.next_batch().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert!(source.next_batch().await.unwrap().is_none());
    }
}
