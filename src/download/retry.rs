//! Retry bookkeeping and randomized backoff for download attempts.
//!
//! Every non-success attempt is classified into a [`FailureKind`]. The
//! [`BackoffPolicy`] turns that kind plus the task's [`RetryState`] into a
//! [`RetryDecision`]: how long to sleep, and whether to try again afterwards.
//!
//! # Backoff rules
//!
//! | Kind | Delay | Counts toward cap |
//! |------|-------|-------------------|
//! | 429 | `U(10s,30s) + attempt_count * U(5s,15s)` | no |
//! | other status | `U(2s,8s)` | yes |
//! | transport | `U(3s,10s)` | yes |
//!
//! A task gives up once more than [`MAX_FAILED_ATTEMPTS`] ordinary failures
//! have been recorded. Rate-limited attempts are retried without limit.
//!
//! # Example
//!
//! ```
//! use album_dl_core::download::{BackoffPolicy, FailureKind, RetryDecision, RetryState};
//!
//! let policy = BackoffPolicy::default();
//! let mut state = RetryState::new();
//!
//! match policy.next_step(FailureKind::Status(503), &mut state) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("retrying in {delay:?} (attempt {attempt})");
//!     }
//!     RetryDecision::GiveUp { .. } => unreachable!("first failure never gives up"),
//! }
//! assert_eq!(state.attempt_count(), 1);
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::DownloadError;
use super::constants::{
    MAX_FAILED_ATTEMPTS, RATE_LIMIT_BASE, RATE_LIMIT_STEP, STATUS_RETRY_DELAY,
    TRANSPORT_RETRY_DELAY,
};

/// Classification of a non-success attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429 Too Many Requests.
    RateLimited,

    /// Any other non-200 status code.
    Status(u16),

    /// The request never produced a usable response (DNS, connect, timeout, body or write error).
    Transport,
}

/// How a response status should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 200: write the body and finish.
    Success,
    /// 429: back off and retry without limit.
    RateLimited,
    /// Anything else, including other 2xx and 3xx codes.
    Failed(u16),
}

/// Maps a status code to its handling class.
///
/// Only an exact 200 counts as success.
#[must_use]
pub fn classify_status(status: u16) -> ResponseClass {
    match status {
        200 => ResponseClass::Success,
        429 => ResponseClass::RateLimited,
        other => ResponseClass::Failed(other),
    }
}

/// Classifies a failed attempt for retry decisions.
///
/// | Error | Kind |
/// |-------|------|
/// | HTTP 429 | RateLimited |
/// | any other HTTP status | Status |
/// | timeout, network, IO, invalid URL | Transport |
#[must_use]
pub fn classify_error(error: &DownloadError) -> FailureKind {
    match error {
        DownloadError::HttpStatus { status, .. } => match classify_status(*status) {
            ResponseClass::RateLimited => FailureKind::RateLimited,
            ResponseClass::Success | ResponseClass::Failed(_) => FailureKind::Status(*status),
        },
        DownloadError::Timeout { .. }
        | DownloadError::Network { .. }
        | DownloadError::Io { .. }
        | DownloadError::InvalidUrl { .. } => FailureKind::Transport,
    }
}

/// Decision on what to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then issue the next request.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Attempt count after this failure was recorded.
        attempt: u32,
    },

    /// Sleep for `delay`, then report the task as failed.
    GiveUp {
        /// How long to wait before reporting.
        delay: Duration,
        /// Attempt count after this failure was recorded.
        attempt: u32,
    },
}

impl RetryDecision {
    /// Returns the delay carried by either variant.
    #[must_use]
    pub fn delay(&self) -> Duration {
        match self {
            Self::Retry { delay, .. } | Self::GiveUp { delay, .. } => *delay,
        }
    }
}

/// Per-task retry counters. Lives only as long as the task's retry loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt_count: u32,
    failure_count: u32,
}

impl RetryState {
    /// Creates fresh counters (both zero).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-success responses and transport errors seen so far, 429s included.
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Ordinary failures seen so far; 429s excluded.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    fn record(&mut self, kind: FailureKind) {
        self.attempt_count = self.attempt_count.saturating_add(1);
        if kind != FailureKind::RateLimited {
            self.failure_count = self.failure_count.saturating_add(1);
        }
    }
}

/// Inclusive delay range sampled uniformly at millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Creates a range; the bounds are swapped if given in the wrong order.
    #[must_use]
    pub fn new(a: Duration, b: Duration) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// A range that always yields `delay`.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    /// Lower bound of the range.
    #[must_use]
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound of the range.
    #[must_use]
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws a uniformly distributed delay within the range.
    #[must_use]
    pub fn sample(&self) -> Duration {
        let min_ms = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(min_ms..=max_ms))
    }
}

impl From<(Duration, Duration)> for DelayRange {
    fn from((a, b): (Duration, Duration)) -> Self {
        Self::new(a, b)
    }
}

/// Backoff configuration shared by every task of an engine.
///
/// # Default Values
///
/// - rate-limit base: 10s..30s
/// - rate-limit step: 5s..15s per recorded attempt
/// - status delay: 2s..8s
/// - transport delay: 3s..10s
/// - max failed attempts: 10
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    rate_limit_base: DelayRange,
    rate_limit_step: DelayRange,
    status_delay: DelayRange,
    transport_delay: DelayRange,
    max_failed_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            rate_limit_base: RATE_LIMIT_BASE.into(),
            rate_limit_step: RATE_LIMIT_STEP.into(),
            status_delay: STATUS_RETRY_DELAY.into(),
            transport_delay: TRANSPORT_RETRY_DELAY.into(),
            max_failed_attempts: MAX_FAILED_ATTEMPTS,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy with custom delay ranges.
    #[must_use]
    pub fn new(
        rate_limit_base: DelayRange,
        rate_limit_step: DelayRange,
        status_delay: DelayRange,
        transport_delay: DelayRange,
        max_failed_attempts: u32,
    ) -> Self {
        Self {
            rate_limit_base,
            rate_limit_step,
            status_delay,
            transport_delay,
            max_failed_attempts,
        }
    }

    /// Same shape as the default policy with every range scaled down to milliseconds.
    ///
    /// Useful for tests and for local mirrors that do not need polite pacing.
    #[must_use]
    pub fn scaled_to_millis() -> Self {
        let ms = Duration::from_millis;
        Self {
            rate_limit_base: DelayRange::new(ms(10), ms(30)),
            rate_limit_step: DelayRange::new(ms(5), ms(15)),
            status_delay: DelayRange::new(ms(2), ms(8)),
            transport_delay: DelayRange::new(ms(3), ms(10)),
            max_failed_attempts: MAX_FAILED_ATTEMPTS,
        }
    }

    /// Replaces the ordinary-failure cap.
    #[must_use]
    pub fn with_max_failed_attempts(mut self, max_failed_attempts: u32) -> Self {
        self.max_failed_attempts = max_failed_attempts;
        self
    }

    /// Returns the ordinary-failure cap.
    #[must_use]
    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    /// Records a failure on `state` and decides what happens next.
    ///
    /// The delay is computed from the attempt count *before* this failure is
    /// recorded, so the first 429 waits `U(base)` with no step added.
    #[instrument(level = "debug", skip(self, state), fields(attempt = state.attempt_count))]
    pub fn next_step(&self, kind: FailureKind, state: &mut RetryState) -> RetryDecision {
        let delay = match kind {
            FailureKind::RateLimited => self.rate_limit_delay(state.attempt_count),
            FailureKind::Status(_) => self.status_delay(),
            FailureKind::Transport => self.transport_delay(),
        };
        state.record(kind);

        let attempt = state.attempt_count;
        if kind != FailureKind::RateLimited && self.is_exhausted(state.failure_count) {
            debug!(
                attempt,
                failures = state.failure_count,
                max = self.max_failed_attempts,
                "failure cap reached"
            );
            return RetryDecision::GiveUp { delay, attempt };
        }

        debug!(attempt, delay_ms = delay.as_millis(), "will retry");
        RetryDecision::Retry { delay, attempt }
    }

    /// Delay for a 429 seen after `attempt_count` earlier non-success attempts.
    #[must_use]
    pub fn rate_limit_delay(&self, attempt_count: u32) -> Duration {
        let step = self.rate_limit_step.sample().saturating_mul(attempt_count);
        self.rate_limit_base.sample().saturating_add(step)
    }

    /// Delay after a non-429 status.
    #[must_use]
    pub fn status_delay(&self) -> Duration {
        self.status_delay.sample()
    }

    /// Delay after a transport error.
    #[must_use]
    pub fn transport_delay(&self) -> Duration {
        self.transport_delay.sample()
    }

    /// True once `failure_count` ordinary failures exceed the cap.
    #[must_use]
    pub fn is_exhausted(&self, failure_count: u32) -> bool {
        failure_count > self.max_failed_attempts
    }

    /// Smallest delay [`rate_limit_delay`](Self::rate_limit_delay) can return for `attempt_count`.
    #[must_use]
    pub fn rate_limit_floor(&self, attempt_count: u32) -> Duration {
        self.rate_limit_base
            .min()
            .saturating_add(self.rate_limit_step.min().saturating_mul(attempt_count))
    }
}
