//! Directory-level batch conversion.

use std::any::Any;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use super::convert::convert_as;
use super::error::{ConversionError, ConversionErrorKind};
use super::source::SourceFormat;
use crate::report::Reporter;

/// Counters and outcomes of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub processed: usize,
    pub successful: usize,
    /// Workbooks written, in processing order.
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.processed - self.successful
    }

    fn record(&mut self, input: PathBuf, outcome: Result<PathBuf, ConversionError>) {
        self.processed += 1;
        match outcome {
            Ok(output) => {
                self.successful += 1;
                self.outputs.push(output);
            }
            Err(e) => self.failures.push(FileFailure {
                input,
                message: e.kind.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    pub input: PathBuf,
    pub message: String,
}

/// Errors that stop a batch before any file is converted.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Input directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Input path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to create output directory '{}': {source}", .path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list input directory '{}': {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Convert files on the rayon thread pool.
    pub parallel: bool,
}

/// Converts every `.sas7bdat` and `.xpt` file directly inside `input`.
///
/// Workbooks go to `output`, or next to the inputs when it is `None`. A
/// failing file is reported and counted; it never stops the batch.
pub fn convert_folder(
    input: &Path,
    output: Option<&Path>,
    reporter: &dyn Reporter,
) -> Result<BatchResult, BatchError> {
    convert_folder_with(input, output, BatchOptions::default(), reporter)
}

pub fn convert_folder_with(
    input: &Path,
    output: Option<&Path>,
    options: BatchOptions,
    reporter: &dyn Reporter,
) -> Result<BatchResult, BatchError> {
    if !input.exists() {
        return Err(BatchError::DirectoryNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Err(BatchError::NotADirectory(input.to_path_buf()));
    }

    let out_dir = output.unwrap_or(input);
    fs::create_dir_all(out_dir).map_err(|source| BatchError::OutputDirectory {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let files = discover_files(input)?;
    debug!(
        input = %input.display(),
        output = %out_dir.display(),
        files = files.len(),
        parallel = options.parallel,
        "Starting batch"
    );
    reporter.batch_started(files.len());

    let convert = |(path, format): &(PathBuf, SourceFormat)| {
        let outcome = isolate(path, || convert_as(path, Some(out_dir), *format));
        match &outcome {
            Ok(written) => reporter.file_converted(path, written),
            Err(e) => reporter.file_failed(path, e),
        }
        (path.clone(), outcome)
    };
    let outcomes: Vec<_> = if options.parallel {
        files.par_iter().map(convert).collect()
    } else {
        files.iter().map(convert).collect()
    };

    let mut result = BatchResult::default();
    for (path, outcome) in outcomes {
        result.record(path, outcome);
    }

    reporter.batch_finished(&result);
    Ok(result)
}

/// Runs one file's conversion, turning a panic into a failure for that file.
fn isolate<F>(input: &Path, convert: F) -> Result<PathBuf, ConversionError>
where
    F: FnOnce() -> Result<PathBuf, ConversionError>,
{
    panic::catch_unwind(AssertUnwindSafe(convert)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!(input = %input.display(), %message, "Conversion panicked");
        Err(ConversionError::new(input, ConversionErrorKind::Panicked(message)))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Lists the regular files in `dir` with a supported extension.
///
/// Extensions match regardless of ASCII case, so `DM.XPT` is picked up.
/// SAS7BDAT files come first, then XPT files; each group is sorted by path.
pub fn discover_files(dir: &Path) -> Result<Vec<(PathBuf, SourceFormat)>, BatchError> {
    let read_error = |source| BatchError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(format) = SourceFormat::from_path(&path) {
            found.push((path, format));
        }
    }

    found.sort_by(|(a, fa), (b, fb)| {
        let rank = |f: &SourceFormat| SourceFormat::ALL.iter().position(|x| x == f);
        rank(fa).cmp(&rank(fb)).then_with(|| a.cmp(b))
    });
    Ok(found)
}
