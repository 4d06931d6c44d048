//! Output path resolution.

use std::path::{Path, PathBuf};

/// Computes where the workbook for `input` is written.
///
/// Generated names have the form `<stem>-<extension>.xlsx`, keeping the
/// source format visible (`visits.xpt` becomes `visits-xpt.xlsx`).
///
/// - No `output`: the generated name next to the input.
/// - `output` is an existing directory or has no extension: the generated
///   name inside `output`.
/// - Otherwise `output` is used as given.
pub fn resolve_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    let name = generated_name(input);
    match output {
        None => input.with_file_name(name),
        Some(out) if out.is_dir() || out.extension().is_none() => out.join(name),
        Some(out) => out.to_path_buf(),
    }
}

fn generated_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let format_tag = input
        .extension()
        .map(|e| e.to_string_lossy())
        .unwrap_or_default();
    format!("{stem}-{format_tag}.xlsx")
}
