//! sas2xlsx: batch conversion of SAS7BDAT and XPT datasets to Excel workbooks.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use sas2xlsx::cli::{self, Cli};
use sas2xlsx::utils::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    match cli::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Conversion failed: {e}");
            ExitCode::FAILURE
        }
    }
}
