//! Album Downloader Core Library
//!
//! Downloads every image of a public photo album: a [`source::TaskSource`]
//! discovers `(url, filename)` pairs page by page, and the
//! [`download::DownloadEngine`] fetches them concurrently with bounded
//! retries and rate-limit backoff.
//!
//! # Architecture
//!
//! - [`download`] - Concurrent download pipeline, retry policy, HTTP client
//! - [`source`] - Pluggable task sources (album page walker, URL lists)

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod source;
mod user_agent;

// Re-export commonly used types
pub use download::{
    BackoffPolicy, DEFAULT_CONCURRENCY, DownloadEngine, DownloadError, DownloadOutcome,
    DownloadStats, DownloadTask, EngineError, FailureReason, HttpClient, OutcomeStatus, RunSummary,
};
pub use source::{
    AlbumSelectors, AlbumWalker, FilenameScheme, SourceError, TaskSource, UrlListSource,
};
