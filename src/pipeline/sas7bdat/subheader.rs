//! SAS7BDAT subheader parsing.
//!
//! Metadata pages start with a table of subheader pointers. Each subheader
//! begins with a signature that identifies it; the ones read here describe
//! the row layout, column names, column attributes, and display formats and
//! labels. Field offsets scale with the word size (4 or 8 bytes).

use super::constants::*;
use super::page::page_bit_offset;
use super::{Compression, SasDataType, SasError};
use crate::pipeline::bytes::Endian;

#[derive(Debug, Clone)]
pub struct SubheaderPointer {
    /// Byte offset of the subheader within the page.
    pub offset: u64,
    pub length: u64,
    /// 0 = plain, 1 = truncated, 4 = compressed.
    pub compression: u8,
    pub subheader_type: u8,
}

impl SubheaderPointer {
    /// Whether the pointer addresses a compressed data row rather than metadata.
    pub fn is_compressed_row(&self) -> bool {
        self.compression != 0 && self.subheader_type == POINTER_TYPE_ROW
    }
}

/// A reference to text stored in a column text block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextRef {
    pub block: u16,
    pub offset: u16,
    pub length: u16,
}

#[derive(Debug, Clone)]
pub struct ColumnAttrs {
    /// Byte offset of the column within a row.
    pub offset: u64,
    pub length: u32,
    pub data_type: SasDataType,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnFormat {
    pub format: TextRef,
    pub label: TextRef,
}

/// Metadata accumulated over all subheaders of a file.
#[derive(Debug, Clone, Default)]
pub struct SubheaderState {
    pub row_length: u64,
    pub row_count: u64,
    pub column_count: u64,
    pub max_rows_on_mix_page: u64,
    pub text_blocks: Vec<Vec<u8>>,
    pub names: Vec<TextRef>,
    pub attrs: Vec<ColumnAttrs>,
    pub formats: Vec<ColumnFormat>,
    pub compression: Compression,
}

/// Reads the subheader pointer table that follows the page header.
pub fn parse_subheader_pointers(
    page: &[u8],
    page_index: u64,
    is_64bit: bool,
    endian: Endian,
    subheader_count: u16,
) -> Result<Vec<SubheaderPointer>, SasError> {
    let word = word_len(is_64bit);
    let table_start = page_bit_offset(is_64bit) + PAGE_HEADER_FIELDS_LEN;
    let pointer_len = 3 * word;

    (0..subheader_count as usize)
        .map(|i| {
            let at = table_start + i * pointer_len;
            if at + pointer_len > page.len() {
                return Err(SasError::MalformedPage {
                    page_index,
                    message: format!("subheader pointer {i} exceeds page bounds"),
                });
            }
            Ok(SubheaderPointer {
                offset: endian.word(page, at, is_64bit),
                length: endian.word(page, at + word, is_64bit),
                compression: page[at + 2 * word],
                subheader_type: page[at + 2 * word + 1],
            })
        })
        .collect()
}

/// Reads one metadata subheader into `state`. Unknown signatures are skipped.
pub fn process_subheader(
    page: &[u8],
    pointer: &SubheaderPointer,
    page_index: u64,
    is_64bit: bool,
    endian: Endian,
    state: &mut SubheaderState,
) -> Result<(), SasError> {
    if pointer.length == 0 {
        return Ok(());
    }

    let start = pointer.offset as usize;
    let end = start + pointer.length as usize;
    if end > page.len() {
        return Err(SasError::MalformedPage {
            page_index,
            message: format!("subheader at {start}..{end} exceeds page bounds"),
        });
    }
    let data = &page[start..end];
    if data.len() < 4 {
        return Ok(());
    }

    let mut signature = endian.u32(data, 0);
    // 64-bit big-endian files carry the distinguishing word second.
    if is_64bit
        && endian == Endian::Big
        && (signature == 0xFFFF_FFFF || signature == 0)
        && data.len() >= 8
    {
        signature = endian.u32(data, 4);
    }

    let word = word_len(is_64bit);
    match signature {
        SIG_ROWSIZE => read_row_size(data, word, is_64bit, endian, state),
        SIG_COLUMNSIZE => {
            if data.len() >= 2 * word {
                state.column_count = endian.word(data, word, is_64bit);
            }
        }
        SIG_COLUMNTEXT => read_column_text(data, word, state),
        SIG_COLUMNNAME => read_column_names(data, word, endian, state),
        SIG_COLUMNATTRS => read_column_attrs(data, word, is_64bit, endian, state),
        SIG_FORMAT => read_column_format(data, word, endian, state),
        _ => {}
    }

    Ok(())
}

fn word_len(is_64bit: bool) -> usize {
    if is_64bit {
        8
    } else {
        4
    }
}

/// Entries of the name and attribute subheaders sit between a header of
/// `word + 8` bytes and a trailer of `word + 4` bytes.
fn entry_count(data_len: usize, word: usize, entry_len: usize) -> usize {
    data_len.saturating_sub(2 * word + 12) / entry_len
}

fn read_row_size(
    data: &[u8],
    word: usize,
    is_64bit: bool,
    endian: Endian,
    state: &mut SubheaderState,
) {
    if data.len() >= 7 * word {
        state.row_length = endian.word(data, 5 * word, is_64bit);
        state.row_count = endian.word(data, 6 * word, is_64bit);
    }
    if data.len() >= 16 * word {
        state.max_rows_on_mix_page = endian.word(data, 15 * word, is_64bit);
    }
}

fn read_column_text(data: &[u8], word: usize, state: &mut SubheaderState) {
    if data.len() <= word {
        return;
    }
    let block = &data[word..];

    if state.text_blocks.is_empty() {
        let literal = block
            .get(COMPRESSION_LITERAL_OFFSET..COMPRESSION_LITERAL_OFFSET + 8)
            .unwrap_or_default();
        if literal == COMPRESSION_SIGNATURE_RLE {
            state.compression = Compression::Rle;
        } else if literal == COMPRESSION_SIGNATURE_RDC {
            state.compression = Compression::Rdc;
        }
    }

    state.text_blocks.push(block.to_vec());
}

fn read_column_names(data: &[u8], word: usize, endian: Endian, state: &mut SubheaderState) {
    const ENTRY_LEN: usize = 8;
    let start = word + 8;
    for i in 0..entry_count(data.len(), word, ENTRY_LEN) {
        let at = start + i * ENTRY_LEN;
        state.names.push(TextRef {
            block: endian.u16(data, at),
            offset: endian.u16(data, at + 2),
            length: endian.u16(data, at + 4),
        });
    }
}

fn read_column_attrs(
    data: &[u8],
    word: usize,
    is_64bit: bool,
    endian: Endian,
    state: &mut SubheaderState,
) {
    let entry_len = word + 8;
    let start = word + 8;
    for i in 0..entry_count(data.len(), word, entry_len) {
        let at = start + i * entry_len;
        let data_type = if data[at + word + 6] == 1 {
            SasDataType::Numeric
        } else {
            SasDataType::Character
        };
        state.attrs.push(ColumnAttrs {
            offset: endian.word(data, at, is_64bit),
            length: endian.u32(data, at + word),
            data_type,
        });
    }
}

/// Format and label subheaders describe one column each, in column order.
fn read_column_format(data: &[u8], word: usize, endian: Endian, state: &mut SubheaderState) {
    let base = 22 + 3 * word;
    if data.len() < base + 12 {
        state.formats.push(ColumnFormat::default());
        return;
    }
    let text_ref = |at: usize| TextRef {
        block: endian.u16(data, at),
        offset: endian.u16(data, at + 2),
        length: endian.u16(data, at + 4),
    };
    state.formats.push(ColumnFormat {
        format: text_ref(base),
        label: text_ref(base + 6),
    });
}
