//! Report module - batch progress and conversion summaries
//!
//! The batch driver talks to a [`Reporter`] it is handed, so callers choose
//! between terminal output, plain log lines, or capturing events in tests.

pub mod console;
pub mod summary;

use std::path::Path;

use crate::pipeline::{BatchResult, ConversionError};

pub use console::ConsoleReporter;
pub use summary::*;

/// Receives batch events. Called from worker threads in parallel mode.
pub trait Reporter: Sync {
    /// Called once the input files are known.
    fn batch_started(&self, total: usize);

    fn file_converted(&self, input: &Path, output: &Path);

    fn file_failed(&self, input: &Path, error: &ConversionError);

    /// Called with the final counters.
    fn batch_finished(&self, result: &BatchResult);
}

/// Reports through log events only: failures, the summary and the
/// no-files warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn batch_started(&self, _total: usize) {}

    fn file_converted(&self, _input: &Path, _output: &Path) {}

    fn file_failed(&self, input: &Path, error: &ConversionError) {
        log_failure(input, error);
    }

    fn batch_finished(&self, result: &BatchResult) {
        log_summary(result);
    }
}
