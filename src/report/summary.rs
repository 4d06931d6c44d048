//! Batch summary: log lines, terminal card and JSON export

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::pipeline::{BatchResult, ConversionError};

/// Logs a per-file failure.
pub fn log_failure(input: &Path, error: &ConversionError) {
    error!("Failed to convert {}: {}", input.display(), error.kind);
}

/// Logs the three counters, and a warning when nothing matched.
pub fn log_summary(result: &BatchResult) {
    info!("Conversion Summary:");
    info!("Total files processed: {}", result.processed);
    info!("Successful conversions: {}", result.successful);
    info!("Failed conversions: {}", result.failed());

    if result.processed == 0 {
        warn!("No .sas7bdat or .xpt files found in the specified directory");
    }
}

/// Prints the summary card to stdout.
pub fn print_summary_card(result: &BatchResult, elapsed: Duration) {
    println!();
    println!(
        "    {} {}",
        style("📋").cyan(),
        style("CONVERSION SUMMARY").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("📁 Files Processed"),
        Cell::new(result.processed),
    ]);
    table.add_row(vec![
        Cell::new("✅ Successful"),
        Cell::new(result.successful)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("❌ Failed"),
        Cell::new(result.failed()).fg(if result.failed() == 0 {
            Color::White
        } else {
            Color::Red
        }),
    ]);
    table.add_row(vec![
        Cell::new("⏱️  Elapsed"),
        Cell::new(format!("{:.2}s", elapsed.as_secs_f64())),
    ]);

    for line in table.to_string().lines() {
        println!("    {}", line);
    }

    if !result.failures.is_empty() {
        println!();
        println!(
            "    {} {}",
            style("📝").cyan(),
            style("FAILED FILES").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        for failure in &result.failures {
            println!(
                "      {} {}",
                style("•").dim(),
                style(failure.input.display()).yellow()
            );
            println!("        {}", style(&failure.message).dim());
        }
    }
    println!();
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    #[serde(flatten)]
    result: &'a BatchResult,
    failed: usize,
}

/// Writes the batch result as pretty-printed JSON.
pub fn write_summary_json(result: &BatchResult, path: &Path) -> io::Result<()> {
    let summary = JsonSummary {
        result,
        failed: result.failed(),
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &summary)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
