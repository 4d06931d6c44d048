//! Terminal styling for the command-line output

use console::{style, Emoji};
use std::path::Path;

// Emoji icons with fallbacks for terminals that don't support them
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[ok] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[x] ");

/// Print the run header with input and output locations
pub fn print_header(version: &str, input: &Path, output: &Path) {
    println!();
    println!(
        "    {} {}",
        style("sas2xlsx").cyan().bold(),
        style(format!("v{version}")).dim()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!("    {}Input:  {}", FOLDER, truncate_path(input, 40));
    println!("    {}Output: {}", SAVE, truncate_path(output, 40));
    println!();
}

/// Print a success line
pub fn print_success(message: &str) {
    println!("    {}{}", CHECK, style(message).green());
}

/// Print a failure line
pub fn print_failure(message: &str) {
    println!("    {}{}", CROSS, style(message).red());
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

/// Keeps the tail of `s`, which holds the file name.
fn truncate_string(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(count - max_len + 3).collect();
        format!("...{tail}")
    }
}
