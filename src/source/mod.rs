//! Task sources: where download tasks come from.
//!
//! A [`TaskSource`] hands the pipeline one batch of tasks at a time until it
//! is exhausted. The engine drains each batch before asking for the next, so
//! a page walker never runs ahead of its downloads.
//!
//! Implementations:
//! - [`AlbumWalker`] - fetches album pages over HTTP and follows pagination
//! - [`UrlListSource`] - a fixed list of URLs from arguments, stdin or a file

mod album;
mod error;
mod naming;
mod url_list;

use async_trait::async_trait;

use crate::download::DownloadTask;

pub use album::{AlbumSelectors, AlbumWalker, DEFAULT_IMAGE_SELECTOR, DEFAULT_NEXT_SELECTOR};
pub use error::SourceError;
pub use naming::{DEFAULT_EXTENSION, DEFAULT_PREFIX, FilenameScheme};
pub use url_list::UrlListSource;

/// Produces batches of download tasks.
///
/// `Ok(None)` signals exhaustion; after that the source is not polled again.
#[async_trait]
pub trait TaskSource: Send {
    /// Returns the next batch of tasks, or `None` once nothing is left.
    async fn next_batch(&mut self) -> Result<Option<Vec<DownloadTask>>, SourceError>;
}
