//! Handle for user-facing run output
//!
//! Created once in `main` and passed down to the runner. A quiet reporter
//! prints nothing and hands out hidden progress bars, which keeps tests and
//! `--quiet` runs silent without touching the `tracing` stream.

use std::time::Duration;

use indicatif::ProgressBar;

use super::progress::{
    create_progress_bar, create_spinner, finish_with_failure, finish_with_success,
};
use super::styling::{print_count, print_info, print_step_header, print_step_time, print_success};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reporter {
    enabled: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    /// Reporter that writes styled output to the terminal
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Reporter that writes nothing
    pub fn quiet() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn step(&self, step_num: u8, title: &str) {
        if self.enabled {
            print_step_header(step_num, title);
        }
    }

    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.enabled {
            create_spinner(message)
        } else {
            ProgressBar::hidden()
        }
    }

    pub fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        if self.enabled {
            create_progress_bar(len, message)
        } else {
            ProgressBar::hidden()
        }
    }

    pub fn finish(&self, pb: &ProgressBar, message: &str) {
        finish_with_success(pb, message);
    }

    pub fn abandon(&self, pb: &ProgressBar, message: &str) {
        finish_with_failure(pb, message);
    }

    pub fn success(&self, message: &str) {
        if self.enabled {
            print_success(message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled {
            print_info(message);
        }
    }

    pub fn count(&self, description: &str, count: usize, detail: Option<&str>) {
        if self.enabled {
            print_count(description, count, detail);
        }
    }

    pub fn step_time(&self, elapsed: Duration) {
        if self.enabled {
            print_step_time(elapsed);
        }
    }
}
