//! Download engine for concurrent image downloads with retry support.
//!
//! The engine runs [`DownloadTask`]s at most `concurrency` at a time. Each
//! task owns its whole retry loop, and its [`DownloadOutcome`] is streamed to
//! the caller as soon as it finishes, in completion order.
//!
//! # Example
//!
//! ```no_run
//! use album_dl_core::download::{BackoffPolicy, DownloadEngine, DownloadTask, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(10, BackoffPolicy::default(), HttpClient::new())?;
//! let tasks = vec![DownloadTask::new(
//!     "https://example.com/a_b.jpg",
//!     "downloaded_images",
//!     "flickr_image_1.jpg",
//! )];
//! let mut outcomes = engine.submit(tasks);
//! while let Some(outcome) = outcomes.recv().await {
//!     println!("{outcome}");
//! }
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, instrument, warn};

use super::client::save_body;
use super::retry::{BackoffPolicy, FailureKind, RetryDecision, RetryState, classify_error};
use super::task::{DownloadOutcome, DownloadTask, FailureReason};
use super::{DownloadError, HttpClient};
use crate::source::{SourceError, TaskSource};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Receiving end of a [`DownloadEngine::submit`] call.
///
/// Yields one outcome per submitted task and closes once all have reported.
pub type OutcomeReceiver = mpsc::UnboundedReceiver<DownloadOutcome>;

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Running counters for every task an engine has executed.
///
/// Uses atomic counters so workers can update them without coordination.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
    rate_limited: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successfully completed downloads.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of failed downloads.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the total number of tasks finished (completed + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed()
    }

    /// Returns the number of retries made, 429 retries included.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Returns how many 429 responses were received.
    #[must_use]
    pub fn rate_limited(&self) -> usize {
        self.rate_limited.load(Ordering::SeqCst)
    }

    fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a [`DownloadEngine::run_source`] walk did.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Batches (album pages) pulled from the source.
    pub batches: usize,
    /// Tasks submitted across all batches.
    pub submitted: usize,
    /// Tasks that ended in success.
    pub completed: usize,
    /// Tasks that ended in failure.
    pub failed: usize,
    /// Error that cut the walk short, if any.
    pub source_error: Option<SourceError>,
}

/// Download engine for concurrent downloads with retry support.
///
/// # Concurrency Model
///
/// - Each task runs in its own Tokio task
/// - A semaphore permit is acquired before a task starts and held until its
///   retry loop ends (RAII)
/// - Clones share the semaphore, so the limit spans every `submit` call
///
/// # Retry Behavior
///
/// - 429 responses back off with linearly growing jitter and never give up
/// - Other statuses and transport errors give up after the policy's cap
/// - A task failure is reported as an outcome and never stops other tasks
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    policy: BackoffPolicy,
    client: HttpClient,
    stats: Arc<DownloadStats>,
}

impl DownloadEngine {
    /// Creates a new download engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if `concurrency` is outside 1-100.
    ///
    /// # Example
    ///
    /// ```
    /// use album_dl_core::download::{BackoffPolicy, DownloadEngine, HttpClient};
    ///
    /// let engine = DownloadEngine::new(10, BackoffPolicy::default(), HttpClient::new()).unwrap();
    /// assert_eq!(engine.concurrency(), 10);
    /// ```
    #[instrument(level = "debug", skip(policy, client))]
    pub fn new(
        concurrency: usize,
        policy: BackoffPolicy,
        client: HttpClient,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            max_failed_attempts = policy.max_failed_attempts(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            policy,
            client,
            stats: Arc::new(DownloadStats::new()),
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the backoff policy.
    #[must_use]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Returns the counters accumulated across all tasks so far.
    #[must_use]
    pub fn stats(&self) -> &DownloadStats {
        &self.stats
    }

    /// Submits tasks to the worker pool and returns their outcomes as they complete.
    ///
    /// Returns immediately. A dispatcher task waits for a free permit before
    /// spawning each task, so at most `concurrency` retry loops run at once.
    /// The receiver yields exactly one outcome per task, then closes.
    pub fn submit<I>(&self, tasks: I) -> OutcomeReceiver
    where
        I: IntoIterator<Item = DownloadTask>,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = self.clone();
        let tasks = tasks.into_iter();

        tokio::spawn(async move {
            for task in tasks {
                // The engine never closes its semaphore.
                let Ok(permit) = Arc::clone(&engine.semaphore).acquire_owned().await else {
                    warn!("semaphore closed, dropping remaining tasks");
                    break;
                };

                let tx = tx.clone();
                let worker = engine.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    let report = task.clone();

                    let outcome =
                        match tokio::spawn(async move { worker.fetch_and_store(&task).await })
                            .await
                        {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                warn!(url = %report.source_url(), error = %e, "download task panicked");
                                DownloadOutcome::failure(
                                    &report,
                                    FailureReason::Exception(e.to_string()),
                                    0,
                                )
                            }
                        };

                    // A dropped receiver means nobody is listening; the file is written either way.
                    let _ = tx.send(outcome);
                });
            }
        });

        rx
    }

    /// Downloads one task, retrying until success or the failure cap.
    ///
    /// Never returns an error: every terminal state is a [`DownloadOutcome`].
    #[instrument(skip(self, task), fields(url = %task.source_url(), filename = %task.filename()))]
    pub async fn fetch_and_store(&self, task: &DownloadTask) -> DownloadOutcome {
        if let Err(e) = ensure_directory(task.destination_directory()).await {
            warn!(error = %e, "cannot create destination directory");
            self.stats.increment_failed();
            return DownloadOutcome::failure(task, FailureReason::Exception(e.to_string()), 0);
        }

        let path = task.destination_path();
        let mut state = RetryState::new();

        loop {
            let error = match self.attempt(task.source_url(), &path).await {
                Ok(bytes) => {
                    debug!(bytes, attempt = state.attempt_count(), "download completed");
                    self.stats.increment_completed();
                    return DownloadOutcome::success(task, path, state.attempt_count());
                }
                Err(e) => e,
            };

            let kind = classify_error(&error);
            let decision = self.policy.next_step(kind, &mut state);
            let delay = decision.delay();

            match kind {
                FailureKind::RateLimited => {
                    self.stats.increment_rate_limited();
                    info!(
                        "Rate limited, waiting {:.1}s for {}",
                        delay.as_secs_f64(),
                        task.filename()
                    );
                }
                FailureKind::Status(_) | FailureKind::Transport => {
                    debug!(
                        attempt = state.attempt_count(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "attempt failed"
                    );
                }
            }

            tokio::time::sleep(delay).await;

            if let RetryDecision::GiveUp { attempt, .. } = decision {
                warn!(attempt, error = %error, "download failed after all attempts");
                self.stats.increment_failed();
                return DownloadOutcome::failure(task, failure_reason(&error), attempt);
            }
            self.stats.increment_retried();
        }
    }

    /// Pulls batches from `source` until it is exhausted, downloading each batch
    /// before asking for the next one.
    ///
    /// `on_outcome` sees every outcome in completion order. A source error
    /// ends the walk; it is logged and recorded in the summary, never returned.
    #[instrument(skip_all)]
    pub async fn run_source<F>(&self, source: &mut dyn TaskSource, mut on_outcome: F) -> RunSummary
    where
        F: FnMut(&DownloadOutcome),
    {
        let mut summary = RunSummary::default();

        loop {
            let batch = match source.next_batch().await {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "task source failed, stopping");
                    summary.source_error = Some(e);
                    break;
                }
            };

            summary.batches += 1;
            summary.submitted += batch.len();
            debug!(batch = summary.batches, tasks = batch.len(), "submitting batch");

            let mut outcomes = self.submit(batch);
            while let Some(outcome) = outcomes.recv().await {
                if outcome.is_success() {
                    summary.completed += 1;
                } else {
                    summary.failed += 1;
                }
                on_outcome(&outcome);
            }
        }

        info!(
            batches = summary.batches,
            submitted = summary.submitted,
            completed = summary.completed,
            failed = summary.failed,
            "source exhausted"
        );
        summary
    }

    async fn attempt(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get(url).await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(DownloadError::http_status(url, status));
        }
        save_body(response, url, path).await
    }
}

/// Creates `dir` and its parents; succeeds if it already exists or another
/// task creates it concurrently.
async fn ensure_directory(dir: &Path) -> Result<(), DownloadError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DownloadError::io(dir, e))
}

fn failure_reason(error: &DownloadError) -> FailureReason {
    match error.status() {
        Some(status) => FailureReason::StatusCode(status),
        None => FailureReason::Exception(error.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_new_valid_concurrency() {
        let engine = DownloadEngine::new(1, BackoffPolicy::default(), HttpClient::new()).unwrap();
        assert_eq!(engine.concurrency(), 1);

        let engine = DownloadEngine::new(10, BackoffPolicy::default(), HttpClient::new()).unwrap();
        assert_eq!(engine.concurrency(), 10);

        let engine = DownloadEngine::new(100, BackoffPolicy::default(), HttpClient::new()).unwrap();
        assert_eq!(engine.concurrency(), 100);
    }

    #[test]
    fn test_engine_new_invalid_concurrency_zero() {
        let result = DownloadEngine::new(0, BackoffPolicy::default(), HttpClient::new());
        assert!(matches!(
            result,
            Err(EngineError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_engine_new_invalid_concurrency_too_high() {
        let result = DownloadEngine::new(101, BackoffPolicy::default(), HttpClient::new());
        assert!(matches!(
            result,
            Err(EngineError::InvalidConcurrency { value: 101 })
        ));
    }

    #[test]
    fn test_engine_error_display() {
        let msg = EngineError::InvalidConcurrency { value: 0 }.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_download_stats_increment() {
        let stats = DownloadStats::new();
        stats.increment_completed();
        stats.increment_completed();
        stats.increment_failed();
        stats.increment_retried();
        stats.increment_rate_limited();

        assert_eq!(stats.completed(), 2);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.retried(), 1);
        assert_eq!(stats.rate_limited(), 1);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_failure_reason_from_status_and_transport() {
        let status = DownloadError::http_status("http://example.com", 503);
        assert_eq!(failure_reason(&status), FailureReason::StatusCode(503));

        let timeout = DownloadError::timeout("http://example.com");
        assert_eq!(
            failure_reason(&timeout),
            FailureReason::Exception("timeout downloading http://example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory(&nested).await.unwrap();
        ensure_directory(&nested).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_directory_fails_when_path_is_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, b"x").unwrap();
        let result = ensure_directory(&file).await;
        assert!(matches!(result, Err(DownloadError::Io { .. })));
    }

    #[tokio::test]
    async fn test_fetch_and_store_directory_failure_is_terminal() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, b"x").unwrap();

        let engine = DownloadEngine::new(1, BackoffPolicy::default(), HttpClient::new()).unwrap();
        let task = DownloadTask::new("http://127.0.0.1:9/a.jpg", &file, "a.jpg");
        let outcome = engine.fetch_and_store(&task).await;

        assert!(matches!(
            outcome.failure_reason(),
            Some(FailureReason::Exception(_))
        ));
        assert_eq!(outcome.attempt_count, 0);
        assert_eq!(engine.stats().failed(), 1);
    }
}
