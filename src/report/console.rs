//! Interactive terminal reporter

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use indicatif::ProgressBar;

use super::{log_failure, log_summary, print_summary_card, Reporter};
use crate::pipeline::{BatchResult, ConversionError};
use crate::utils::create_progress_bar;

/// Shows a progress bar while files convert and a summary card at the end.
#[derive(Default)]
pub struct ConsoleReporter {
    state: Mutex<Option<Progress>>,
}

struct Progress {
    bar: Option<ProgressBar>,
    started: Instant,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(state) = self.state.lock() {
            if let Some(bar) = state.as_ref().and_then(|p| p.bar.as_ref()) {
                f(bar);
            }
        }
    }
}

impl Reporter for ConsoleReporter {
    fn batch_started(&self, total: usize) {
        let bar = (total > 0).then(|| create_progress_bar(total as u64));
        if let Ok(mut state) = self.state.lock() {
            *state = Some(Progress {
                bar,
                started: Instant::now(),
            });
        }
    }

    fn file_converted(&self, input: &Path, _output: &Path) {
        self.with_bar(|bar| {
            if let Some(name) = input.file_name() {
                bar.set_message(name.to_string_lossy().into_owned());
            }
            bar.inc(1);
        });
    }

    fn file_failed(&self, input: &Path, error: &ConversionError) {
        let mut logged = false;
        self.with_bar(|bar| {
            bar.suspend(|| log_failure(input, error));
            bar.inc(1);
            logged = true;
        });
        if !logged {
            log_failure(input, error);
        }
    }

    fn batch_finished(&self, result: &BatchResult) {
        let progress = self.state.lock().ok().and_then(|mut state| state.take());
        let elapsed = progress
            .as_ref()
            .map(|p| p.started.elapsed())
            .unwrap_or_default();
        if let Some(bar) = progress.and_then(|p| p.bar) {
            bar.finish_and_clear();
        }

        log_summary(result);
        print_summary_card(result, elapsed);
    }
}
