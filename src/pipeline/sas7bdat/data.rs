//! Row extraction from SAS7BDAT pages.
//!
//! Rows are fixed-width byte records. Uncompressed rows follow the page
//! header on data pages and the subheader pointer table on mix pages;
//! compressed rows are individual subheaders on metadata and mix pages.

use super::constants::PAGE_HEADER_FIELDS_LEN;
use super::decompress::{decompress_rdc, decompress_rle, DecompressError};
use super::page::{page_bit_offset, PageHeader, PageKind};
use super::{Compression, SasColumn, SasDataType, SasEncoding};
use crate::pipeline::bytes::Endian;
use crate::pipeline::values::ColumnBuilder;

/// Decodes rows into per-column builders.
pub struct RowDecoder<'a> {
    columns: &'a [SasColumn],
    encoding: SasEncoding,
    endian: Endian,
}

impl<'a> RowDecoder<'a> {
    pub fn new(columns: &'a [SasColumn], encoding: SasEncoding, endian: Endian) -> Self {
        Self {
            columns,
            encoding,
            endian,
        }
    }

    /// Appends one value per column. Columns that run past the end of the
    /// row are stored as null.
    pub fn decode(&self, row: &[u8], builders: &mut [ColumnBuilder]) {
        for (column, builder) in self.columns.iter().zip(builders.iter_mut()) {
            let start = column.offset as usize;
            let end = start + column.length as usize;
            let Some(bytes) = row.get(start..end) else {
                builder.push_number(None);
                continue;
            };
            match column.data_type {
                SasDataType::Numeric => builder.push_number(read_number(bytes, self.endian)),
                SasDataType::Character => builder.push_text(read_text(bytes, self.encoding)),
            }
        }
    }
}

/// Reads a numeric value stored in 1 to 8 bytes.
///
/// Short numerics keep the most significant bytes of the double; the rest
/// is zero-filled. SAS missing values are NaNs and come back as `None`.
pub fn read_number(bytes: &[u8], endian: Endian) -> Option<f64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    match endian {
        Endian::Little => buf[8 - bytes.len()..].copy_from_slice(bytes),
        Endian::Big => buf[..bytes.len()].copy_from_slice(bytes),
    }
    let value = endian.f64(&buf, 0);
    (!value.is_nan()).then_some(value)
}

/// Decodes a padded character value; blank values come back as `None`.
pub fn read_text(bytes: &[u8], encoding: SasEncoding) -> Option<String> {
    let decoded = encoding.decode(bytes);
    let trimmed = decoded.trim_end_matches([' ', '\0']);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Locates the uncompressed rows on a page as `(first byte, row count)`.
pub fn page_row_span(
    header: &PageHeader,
    is_64bit: bool,
    max_rows_on_mix_page: u64,
) -> Option<(usize, u64)> {
    let header_end = page_bit_offset(is_64bit) + PAGE_HEADER_FIELDS_LEN;
    match header.kind {
        PageKind::Data => Some((header_end, header.block_count as u64)),
        PageKind::Mix => {
            let pointer_len = if is_64bit { 24 } else { 12 };
            let table_end = header_end + header.subheader_count as usize * pointer_len;
            // Rows start on an 8-byte boundary after the pointer table.
            let start = (table_end + 7) & !7;
            let rows = header
                .block_count
                .saturating_sub(header.subheader_count) as u64;
            Some((start, rows.min(max_rows_on_mix_page)))
        }
        _ => None,
    }
}

/// Expands a compressed row subheader to a full row.
pub fn expand_row(
    data: &[u8],
    compression: Compression,
    row_length: usize,
) -> Result<Vec<u8>, DecompressError> {
    // Rows that did not shrink are stored as-is.
    if data.len() >= row_length {
        return Ok(data[..row_length].to_vec());
    }
    match compression {
        Compression::Rle => decompress_rle(data, row_length),
        Compression::Rdc => decompress_rdc(data, row_length),
        Compression::None => Err(DecompressError::LengthMismatch {
            expected: row_length,
            actual: data.len(),
        }),
    }
}
