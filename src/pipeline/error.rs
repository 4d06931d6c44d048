//! Per-file conversion errors.

use std::path::PathBuf;

use thiserror::Error;

use super::sas7bdat::SasError;
use super::xlsx::WriteError;
use super::xport::XportError;

/// A single file failed to convert.
#[derive(Debug, Error)]
#[error("{}: {kind}", .input.display())]
pub struct ConversionError {
    pub input: PathBuf,
    #[source]
    pub kind: ConversionErrorKind,
}

impl ConversionError {
    pub fn new(input: impl Into<PathBuf>, kind: impl Into<ConversionErrorKind>) -> Self {
        Self {
            input: input.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConversionErrorKind {
    #[error(transparent)]
    Sas7bdat(#[from] SasError),

    #[error(transparent)]
    Xport(#[from] XportError),

    /// Creating the output directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The reader or writer panicked on this file.
    #[error("Conversion panicked: {0}")]
    Panicked(String),
}
