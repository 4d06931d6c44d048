//! Error types for XPORT parsing.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur when reading a SAS transport file.
#[derive(Debug, Error)]
pub enum XportError {
    /// The first record is not a transport library header.
    #[error("Invalid XPORT file: library header record not found")]
    InvalidLibraryHeader,

    #[error("XPORT version 8/9 files are not supported")]
    UnsupportedVersion,

    /// A required header record is absent or out of place.
    #[error("Invalid XPORT file: expected {header} header record at byte {offset}")]
    MissingHeader { header: &'static str, offset: usize },

    #[error("Invalid namestr record {index}: {message}")]
    InvalidNamestr { index: usize, message: String },

    #[error("Variable {name} has unsupported length {length}")]
    UnsupportedLength { name: String, length: usize },

    #[error("XPORT member defines no variables")]
    NoVariables,

    /// The decoded columns could not be assembled into a frame.
    #[error("Failed to build DataFrame: {0}")]
    Frame(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
