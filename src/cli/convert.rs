//! Runs a conversion from parsed command-line arguments

use std::path::Path;

use anyhow::{anyhow, Result};
use console::style;

use super::Cli;
use crate::pipeline::{convert_file, convert_folder_with, BatchOptions, BatchResult};
use crate::report::{write_summary_json, ConsoleReporter, Reporter, SilentReporter};
use crate::utils::{create_spinner, print_failure, print_header, print_success};

/// Converts the folder (or single file) named on the command line.
pub fn run(cli: &Cli) -> Result<()> {
    if cli.input_folder.is_file() {
        run_convert(&cli.input_folder, cli.output.as_deref(), cli.quiet)
    } else {
        let result = run_batch(cli)?;
        if let Some(path) = &cli.summary_json {
            write_summary_json(&result, path)
                .map_err(|e| anyhow!("Failed to write summary to {}: {e}", path.display()))?;
        }
        Ok(())
    }
}

/// Converts one file; a failure is returned as an error.
pub fn run_convert(input: &Path, output: Option<&Path>, quiet: bool) -> Result<()> {
    if quiet {
        convert_file(input, output)?;
        return Ok(());
    }

    let target_hint = output.unwrap_or_else(|| {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    });
    print_header(env!("CARGO_PKG_VERSION"), input, target_hint);

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let spinner = create_spinner(&format!("Converting {}...", style(&name).cyan()));
    let outcome = convert_file(input, output);
    spinner.finish_and_clear();

    match outcome {
        Ok(written) => {
            print_success(&format!("Wrote {}", written.display()));
            println!();
            Ok(())
        }
        Err(e) => {
            print_failure(&format!("Could not convert {name}"));
            println!();
            Err(e.into())
        }
    }
}

/// Converts every matching file in the input folder.
pub fn run_batch(cli: &Cli) -> Result<BatchResult> {
    let options = BatchOptions {
        parallel: cli.parallel,
    };
    let output = cli.output.as_deref();

    let console_reporter;
    let reporter: &dyn Reporter = if cli.quiet {
        &SilentReporter
    } else {
        print_header(
            env!("CARGO_PKG_VERSION"),
            &cli.input_folder,
            output.unwrap_or(&cli.input_folder),
        );
        console_reporter = ConsoleReporter::new();
        &console_reporter
    };

    Ok(convert_folder_with(
        &cli.input_folder,
        output,
        options,
        reporter,
    )?)
}
