//! Single-file conversion: read, resolve the target, write the workbook.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::error::{ConversionError, ConversionErrorKind};
use super::paths::resolve_output_path;
use super::source::SourceFormat;
use super::xlsx::write_xlsx;

/// Converts a `.sas7bdat` file to a workbook and returns the written path.
///
/// `output` may be a directory or a file path, see
/// [`resolve_output_path`](super::paths::resolve_output_path).
pub fn convert_sas7bdat_to_excel(
    input: &Path,
    output: Option<&Path>,
) -> Result<PathBuf, ConversionError> {
    convert_as(input, output, SourceFormat::Sas7bdat)
}

/// Converts a `.xpt` transport file to a workbook and returns the written path.
pub fn convert_xpt_to_excel(
    input: &Path,
    output: Option<&Path>,
) -> Result<PathBuf, ConversionError> {
    convert_as(input, output, SourceFormat::Xpt)
}

/// Converts a file of either supported format, chosen by extension.
pub fn convert_file(input: &Path, output: Option<&Path>) -> Result<PathBuf, ConversionError> {
    match SourceFormat::from_path(input) {
        Some(format) => convert_as(input, output, format),
        None => {
            let extension = input
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            let kind = ConversionErrorKind::UnsupportedFormat(extension);
            error!("Error converting {}: {}", input.display(), kind);
            Err(ConversionError::new(input, kind))
        }
    }
}

/// Reads `input` as `format` regardless of its extension.
pub fn convert_as(
    input: &Path,
    output: Option<&Path>,
    format: SourceFormat,
) -> Result<PathBuf, ConversionError> {
    match run(input, output, format) {
        Ok(target) => {
            info!(
                "Successfully converted {} to {}",
                input.display(),
                target.display()
            );
            Ok(target)
        }
        Err(kind) => {
            error!("Error converting {}: {}", input.display(), kind);
            Err(ConversionError::new(input, kind))
        }
    }
}

fn run(
    input: &Path,
    output: Option<&Path>,
    format: SourceFormat,
) -> Result<PathBuf, ConversionErrorKind> {
    let frame = format.read(input)?;
    let target = resolve_output_path(input, output);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_xlsx(&frame, &target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unsupported_extension() {
        let err = convert_file(Path::new("notes.txt"), None).unwrap_err();
        assert!(matches!(
            err.kind,
            ConversionErrorKind::UnsupportedFormat(ref ext) if ext == "txt"
        ));
    }

    #[test]
    fn test_missing_input_is_a_conversion_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("absent.xpt");
        let err = convert_xpt_to_excel(&input, None).unwrap_err();
        assert_eq!(err.input, input);
        assert!(matches!(err.kind, ConversionErrorKind::Xport(_)));
        assert!(!dir.path().join("absent-xpt.xlsx").exists());
    }

    #[test]
    fn test_corrupt_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.sas7bdat");
        fs::write(&input, b"not a sas dataset").unwrap();
        let out = dir.path().join("out");

        let err = convert_sas7bdat_to_excel(&input, Some(&out)).unwrap_err();
        assert!(matches!(err.kind, ConversionErrorKind::Sas7bdat(_)));
        assert!(!out.exists());
    }
}
