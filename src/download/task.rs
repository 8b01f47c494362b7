//! Download task and outcome value types.

use std::fmt;
use std::path::{Path, PathBuf};

/// One image download request. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    source_url: String,
    destination_directory: PathBuf,
    filename: String,
}

impl DownloadTask {
    /// Creates a task that saves `source_url` as `destination_directory/filename`.
    pub fn new(
        source_url: impl Into<String>,
        destination_directory: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            destination_directory: destination_directory.into(),
            filename: filename.into(),
        }
    }

    /// URL the payload is fetched from.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Directory the payload is written into.
    #[must_use]
    pub fn destination_directory(&self) -> &Path {
        &self.destination_directory
    }

    /// File name inside the destination directory.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Full path the payload is written to.
    #[must_use]
    pub fn destination_path(&self) -> PathBuf {
        self.destination_directory.join(&self.filename)
    }
}

/// Why a task ended without a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The last response carried this non-200, non-429 status.
    StatusCode(u16),
    /// The last attempt failed before a response arrived, or while writing it.
    Exception(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusCode(code) => write!(f, "status code {code}"),
            Self::Exception(message) => write!(f, "exception {message}"),
        }
    }
}

/// Terminal status of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The body was written to `path`.
    Success {
        /// Where the payload landed.
        path: PathBuf,
    },
    /// The retry budget ran out.
    Failure(FailureReason),
}

/// Result of one task. Exactly one is produced per submitted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// File name from the task.
    pub filename: String,
    /// URL from the task.
    pub source_url: String,
    /// Terminal status.
    pub status: OutcomeStatus,
    /// Non-success attempts recorded before the terminal status (0 on a first-try success).
    pub attempt_count: u32,
}

impl DownloadOutcome {
    pub(crate) fn success(task: &DownloadTask, path: PathBuf, attempt_count: u32) -> Self {
        Self {
            filename: task.filename.clone(),
            source_url: task.source_url.clone(),
            status: OutcomeStatus::Success { path },
            attempt_count,
        }
    }

    pub(crate) fn failure(task: &DownloadTask, reason: FailureReason, attempt_count: u32) -> Self {
        Self {
            filename: task.filename.clone(),
            source_url: task.source_url.clone(),
            status: OutcomeStatus::Failure(reason),
            attempt_count,
        }
    }

    /// Returns true for a successful download.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match &self.status {
            OutcomeStatus::Failure(reason) => Some(reason),
            OutcomeStatus::Success { .. } => None,
        }
    }
}

/// Console line for an outcome, one per completed task.
impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            OutcomeStatus::Success { .. } => write!(f, "Downloaded: {}", self.filename),
            OutcomeStatus::Failure(FailureReason::StatusCode(code)) => write!(
                f,
                "Failed to download: {} (Status code: {code})",
                self.source_url
            ),
            OutcomeStatus::Failure(FailureReason::Exception(message)) => {
                write!(f, "Error downloading {}: {message}", self.source_url)
            }
        }
    }
}
