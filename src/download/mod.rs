//! Concurrent download pipeline with rate-limit aware retries.
//!
//! # Features
//!
//! - Bounded worker pool (semaphore permits, default 10)
//! - Outcomes streamed in completion order
//! - Randomized backoff: linearly growing on 429, flat otherwise
//! - Ordinary failures capped at 10 retries; 429 retried without limit
//! - Streaming body writes, overwriting any existing file
//!
//! # Example
//!
//! ```no_run
//! use album_dl_core::download::{BackoffPolicy, DownloadEngine, DownloadTask, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(4, BackoffPolicy::default(), HttpClient::new())?;
//! let task = DownloadTask::new("https://example.com/a.jpg", "./album", "a.jpg");
//! let outcome = engine.fetch_and_store(&task).await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod retry;
mod task;

pub use client::{HttpClient, save_body};
pub use constants::{MAX_FAILED_ATTEMPTS, REQUEST_TIMEOUT_SECS};
pub use engine::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadStats, EngineError, OutcomeReceiver, RunSummary,
};
pub use error::DownloadError;
pub use retry::{
    BackoffPolicy, DelayRange, FailureKind, ResponseClass, RetryDecision, RetryState,
    classify_error, classify_status,
};
pub use task::{DownloadOutcome, DownloadTask, FailureReason, OutcomeStatus};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
