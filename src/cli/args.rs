//! Command-line argument definitions using clap

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// sas2xlsx - Convert all SAS files in a directory to Excel format
#[derive(Parser, Debug)]
#[command(name = "sas2xlsx")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input folder containing .sas7bdat and .xpt files.
    /// A single .sas7bdat or .xpt file is converted on its own.
    pub input_folder: PathBuf,

    /// Output directory (defaults to the input folder).
    /// With a single input file this may also be the workbook path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Convert files in parallel across all CPU cores
    #[arg(long, default_value = "false")]
    pub parallel: bool,

    /// Write the batch summary (counts, outputs, failures) as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Only log warnings and errors; no progress bar or summary card
    #[arg(short, long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// More log detail: -v for debug, -vv for trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log level requested on the command line; `None` defers to `RUST_LOG`.
    pub fn log_level(&self) -> Option<LevelFilter> {
        if self.quiet {
            return Some(LevelFilter::WARN);
        }
        match self.verbose {
            0 => None,
            1 => Some(LevelFilter::DEBUG),
            _ => Some(LevelFilter::TRACE),
        }
    }
}
