//! SAS7BDAT file reader.
//!
//! # Module Structure
//!
//! - `constants` - Magic number, header offsets, page types, subheader signatures
//! - `error` - Error types for parsing failures
//! - `header` - File header parsing (word size, byte order, encoding, page layout)
//! - `page` - Page header parsing
//! - `subheader` - Subheader parsing (row size, column names, attributes, formats)
//! - `column` - Column metadata assembled from subheaders
//! - `decompress` - RLE and RDC decompression
//! - `data` - Row extraction into column builders
//!
//! Files are read in two passes over the pages: the first collects metadata
//! subheaders, the second decodes rows.

pub mod column;
pub mod constants;
pub mod data;
pub mod decompress;
pub mod error;
pub mod header;
pub mod page;
pub mod subheader;

pub use error::SasError;

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252};
use polars::prelude::*;
use tracing::{debug, warn};

use self::column::build_columns;
use self::constants::POINTER_TRUNCATED;
use self::data::{expand_row, page_row_span, RowDecoder};
use self::header::parse_header;
use self::page::parse_page_header;
use self::subheader::{parse_subheader_pointers, process_subheader, SubheaderState};
use crate::pipeline::bytes::Endian;
use crate::pipeline::values::{build_frame, sas_seconds_to_datetime, ColumnBuilder, OutputType};

/// Upper bound on rows preallocated from the declared row count.
const MAX_PREALLOCATED_ROWS: u64 = 1 << 20;

/// Reads a `.sas7bdat` file into a data frame.
///
/// # Errors
/// * `SasError::InvalidMagic` - Not a SAS7BDAT file
/// * `SasError::NoColumns` - The file declares no columns
/// * `SasError::UnsupportedEncoding` - Unknown character encoding
/// * `SasError::TruncatedFile` - File is shorter than its header
/// * `SasError::InvalidPageSize` - The header page size is out of range
/// * `SasError::InvalidRowLength` - Rows are empty or longer than a page
/// * `SasError::Decompression` - A compressed row could not be expanded
pub fn read_sas7bdat(path: &Path) -> Result<SasDataset, SasError> {
    let file = File::open(path)?;
    read_sas7bdat_from(BufReader::new(file))
}

/// Reads SAS7BDAT content from any seekable source.
pub fn read_sas7bdat_from<R: Read + Seek>(mut reader: R) -> Result<SasDataset, SasError> {
    let header = parse_header(&mut reader)?;
    debug!(
        dataset = %header.dataset_name,
        release = %header.sas_release,
        encoding = header.encoding.name(),
        is_64bit = header.is_64bit,
        pages = header.page_count,
        page_size = header.page_size,
        "Parsed SAS7BDAT header"
    );

    let mut pages = PageReader::new(reader, &header)?;

    // First pass: metadata subheaders.
    let mut state = SubheaderState::default();
    while let Some((page_index, page)) = pages.next_page()? {
        let page_header = parse_page_header(page, page_index, header.is_64bit, header.endian)?;
        if !page_header.kind.has_subheaders() {
            continue;
        }
        let pointers = parse_subheader_pointers(
            page,
            page_index,
            header.is_64bit,
            header.endian,
            page_header.subheader_count,
        )?;
        for pointer in pointers.iter().filter(|p| !p.is_compressed_row()) {
            process_subheader(
                page,
                pointer,
                page_index,
                header.is_64bit,
                header.endian,
                &mut state,
            )?;
        }
    }

    let columns = build_columns(&state, header.encoding);
    if columns.is_empty() {
        return Err(SasError::NoColumns);
    }
    if state.row_length == 0 || state.row_length > u64::from(header.page_size) {
        return Err(SasError::InvalidRowLength {
            row_length: state.row_length,
            page_size: header.page_size,
        });
    }
    debug!(
        rows = state.row_count,
        columns = columns.len(),
        row_length = state.row_length,
        compression = ?state.compression,
        "Read SAS7BDAT metadata"
    );

    // Second pass: rows.
    let row_count = state.row_count;
    let row_length = state.row_length as usize;
    let capacity = row_count.min(MAX_PREALLOCATED_ROWS) as usize;
    let mut builders: Vec<ColumnBuilder> = columns
        .iter()
        .map(|c| ColumnBuilder::new(c.output_type, capacity))
        .collect();
    let decoder = RowDecoder::new(&columns, header.encoding, header.endian);
    let mut rows_read: u64 = 0;

    pages.rewind()?;
    while rows_read < row_count {
        let Some((page_index, page)) = pages.next_page()? else {
            break;
        };
        let page_header = parse_page_header(page, page_index, header.is_64bit, header.endian)?;

        if page_header.kind.has_subheaders() && state.compression != Compression::None {
            let pointers = parse_subheader_pointers(
                page,
                page_index,
                header.is_64bit,
                header.endian,
                page_header.subheader_count,
            )?;
            for pointer in &pointers {
                if rows_read >= row_count {
                    break;
                }
                if !pointer.is_compressed_row() || pointer.compression == POINTER_TRUNCATED {
                    continue;
                }
                let start = pointer.offset as usize;
                let Some(raw) = page.get(start..start + pointer.length as usize) else {
                    continue;
                };
                if raw.is_empty() {
                    continue;
                }
                let row = expand_row(raw, state.compression, row_length)
                    .map_err(|source| SasError::Decompression { page_index, source })?;
                decoder.decode(&row, &mut builders);
                rows_read += 1;
            }
        }

        if let Some((start, count)) =
            page_row_span(&page_header, header.is_64bit, state.max_rows_on_mix_page)
        {
            let count = count.min(row_count - rows_read) as usize;
            for i in 0..count {
                let at = start + i * row_length;
                let Some(row) = page.get(at..at + row_length) else {
                    break;
                };
                decoder.decode(row, &mut builders);
                rows_read += 1;
            }
        }
    }

    if rows_read < row_count {
        warn!(
            expected = row_count,
            read = rows_read,
            "SAS7BDAT file ended before all declared rows were read"
        );
    }

    let frame = build_frame(
        columns
            .iter()
            .map(|c| c.name.clone())
            .zip(builders)
            .collect(),
    )?;

    Ok(SasDataset {
        header,
        columns,
        frame,
    })
}

/// Sequential page access over the body of a file.
struct PageReader<R> {
    reader: R,
    body_start: u64,
    page_count: u64,
    next_index: u64,
    buf: Vec<u8>,
}

impl<R: Read + Seek> PageReader<R> {
    fn new(mut reader: R, header: &SasHeader) -> Result<Self, SasError> {
        reader.seek(SeekFrom::Start(header.header_length))?;
        Ok(Self {
            reader,
            body_start: header.header_length,
            page_count: header.page_count,
            next_index: 0,
            buf: vec![0u8; header.page_size as usize],
        })
    }

    /// Returns the next full page, or `None` past the last page. A short
    /// final page ends the file.
    fn next_page(&mut self) -> Result<Option<(u64, &[u8])>, SasError> {
        if self.next_index >= self.page_count {
            return Ok(None);
        }
        match self.reader.read_exact(&mut self.buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.next_index = self.page_count;
                return Ok(None);
            }
            Err(e) => return Err(SasError::Io(e)),
        }
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some((index, &self.buf)))
    }

    fn rewind(&mut self) -> Result<(), SasError> {
        self.reader.seek(SeekFrom::Start(self.body_start))?;
        self.next_index = 0;
        Ok(())
    }
}

/// A decoded SAS7BDAT file.
#[derive(Debug, Clone)]
pub struct SasDataset {
    pub header: SasHeader,
    pub columns: Vec<SasColumn>,
    pub frame: DataFrame,
}

impl SasDataset {
    /// Creation time recorded in the header, if it is a valid timestamp.
    pub fn created(&self) -> Option<chrono::NaiveDateTime> {
        sas_seconds_to_datetime(self.header.created)
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SasDataType {
    /// IEEE 754 double, possibly truncated to fewer than 8 bytes.
    Numeric,
    /// Fixed-width text in the file encoding.
    Character,
}

/// Row compression declared in the column text subheader.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Compression {
    #[default]
    None,
    /// `SASYZCRL`, written by `COMPRESS=CHAR`.
    Rle,
    /// `SASYZCR2`, written by `COMPRESS=BINARY`.
    Rdc,
}

/// Operating system that wrote the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OsType {
    Unix,
    Windows,
    Unknown,
}

/// Text encoding of names, labels and character values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SasEncoding {
    /// Encoding byte 0; text is read as Windows-1252.
    Unspecified,
    Known {
        /// Identifier from the file header.
        id: u16,
        encoding: &'static Encoding,
    },
}

impl SasEncoding {
    pub fn name(self) -> &'static str {
        match self {
            SasEncoding::Unspecified => "unspecified",
            SasEncoding::Known { encoding, .. } => encoding.name(),
        }
    }

    /// Decodes bytes, replacing malformed sequences.
    pub fn decode(self, bytes: &[u8]) -> Cow<'_, str> {
        let encoding = match self {
            SasEncoding::Unspecified => WINDOWS_1252,
            SasEncoding::Known { encoding, .. } => encoding,
        };
        encoding.decode_without_bom_handling(bytes).0
    }
}

/// File-level metadata from the header.
#[derive(Debug, Clone)]
pub struct SasHeader {
    /// 8-byte words and page offsets when true, 4-byte otherwise.
    pub is_64bit: bool,
    pub endian: Endian,
    pub encoding: SasEncoding,
    pub page_size: u32,
    pub page_count: u64,
    pub header_length: u64,
    pub dataset_name: String,
    /// Seconds since 1960-01-01.
    pub created: f64,
    pub modified: f64,
    pub os_type: OsType,
    pub sas_release: String,
}

/// One column of the dataset.
#[derive(Debug, Clone)]
pub struct SasColumn {
    pub name: String,
    pub data_type: SasDataType,
    /// Byte offset within a row.
    pub offset: u64,
    pub length: u32,
    /// Display format such as `DATE9.`; empty when none is set.
    pub format: String,
    pub label: String,
    pub output_type: OutputType,
}
