//! Progress spinner shown while a blocking command runs.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A progress spinner for long-running operations.
///
/// The spinner is cleared when finished so the run log line that follows
/// is the only thing left on screen.
pub struct ProgressSpinner {
    bar: ProgressBar,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar }
    }

    /// Create a spinner that doesn't show (verbose mode, non-TTY, tests).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Create a visible spinner only when `visible` is set.
    pub fn maybe(visible: bool, message: &str) -> Self {
        if visible {
            Self::new(message)
        } else {
            Self::hidden()
        }
    }

    /// Stop and erase the spinner.
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}
