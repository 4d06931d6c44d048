//! Error types for SAS7BDAT parsing.

use polars::prelude::PolarsError;
use thiserror::Error;

use super::decompress::DecompressError;

/// Errors that can occur when reading a SAS7BDAT file.
#[derive(Debug, Error)]
pub enum SasError {
    /// The file does not start with the SAS7BDAT magic number.
    #[error("Invalid SAS7BDAT file: magic number mismatch")]
    InvalidMagic,

    /// The file is shorter than its header claims.
    #[error("Truncated SAS7BDAT file: expected {expected} bytes, found {actual}")]
    TruncatedFile { expected: u64, actual: u64 },

    /// The header declares a page size outside what SAS writes.
    #[error("Invalid SAS7BDAT page size {page_size}")]
    InvalidPageSize { page_size: u32 },

    /// The row size subheader declares rows that cannot fit a page.
    #[error("Invalid SAS7BDAT row length {row_length} for page size {page_size}")]
    InvalidRowLength { row_length: u64, page_size: u32 },

    /// The metadata pages describe no columns at all.
    #[error("SAS7BDAT file defines no columns")]
    NoColumns,

    #[error("Unsupported character encoding in SAS7BDAT file: encoding ID {id}")]
    UnsupportedEncoding { id: u16 },

    /// A page header or subheader pointer points outside its page.
    #[error("Malformed page {page_index}: {message}")]
    MalformedPage { page_index: u64, message: String },

    #[error("Decompression failed for page {page_index}: {source}")]
    Decompression {
        page_index: u64,
        #[source]
        source: DecompressError,
    },

    /// The decoded columns could not be assembled into a frame.
    #[error("Failed to build DataFrame: {0}")]
    Frame(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
