//! Console reporting: one line per finished download, with an optional spinner.

use std::time::Duration;

use album_dl_core::DownloadOutcome;
use indicatif::{ProgressBar, ProgressStyle};

/// Prints outcome lines and keeps a running tally on a spinner.
pub struct Reporter {
    spinner: Option<ProgressBar>,
    completed: usize,
    failed: usize,
}

impl Reporter {
    /// Creates a reporter; the spinner is only drawn when `use_spinner` is set.
    pub fn new(use_spinner: bool) -> Self {
        let spinner = use_spinner.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        Self {
            spinner,
            completed: 0,
            failed: 0,
        }
    }

    /// Prints the outcome line above the spinner.
    pub fn report(&mut self, outcome: &DownloadOutcome) {
        if outcome.is_success() {
            self.completed += 1;
        } else {
            self.failed += 1;
        }

        let line = outcome.to_string();
        match &self.spinner {
            Some(spinner) => {
                spinner.println(line);
                spinner.set_message(self.status_message());
            }
            None => println!("{line}"),
        }
    }

    /// Clears the spinner.
    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }

    fn status_message(&self) -> String {
        format!("{} downloaded, {} failed", self.completed, self.failed)
    }
}

#[cfg(test)]
mod tests {
    use album_dl_core::{DownloadOutcome, FailureReason, OutcomeStatus};

    use super::*;

    fn outcome(status: OutcomeStatus) -> DownloadOutcome {
        DownloadOutcome {
            filename: "flickr_image_1.jpg".to_string(),
            source_url: "https://example.com/1_b.jpg".to_string(),
            status,
            attempt_count: 0,
        }
    }

    #[test]
    fn test_reporter_tallies_outcomes() {
        let mut reporter = Reporter::new(false);
        reporter.report(&outcome(OutcomeStatus::Success {
            path: "x".into(),
        }));
        reporter.report(&outcome(OutcomeStatus::Failure(FailureReason::StatusCode(404))));
        assert_eq!(reporter.completed, 1);
        assert_eq!(reporter.failed, 1);
        assert_eq!(reporter.status_message(), "1 downloaded, 1 failed");
        reporter.finish();
    }
}
