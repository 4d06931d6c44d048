//! SAS7BDAT page headers.

use super::constants::*;
use super::SasError;
use crate::pipeline::bytes::Endian;

/// What a page holds, from its type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Subheaders only (META and META2).
    Meta,
    /// Uncompressed rows only.
    Data,
    /// Subheaders followed by uncompressed rows.
    Mix,
    /// Attribute metadata, holds no rows we read.
    Amd,
    /// Compression marker page, holds no rows we read.
    Comp,
    Unknown(u16),
}

impl PageKind {
    pub fn from_type(page_type: u16) -> Self {
        match page_type {
            PAGE_TYPE_META | PAGE_TYPE_META2 => PageKind::Meta,
            PAGE_TYPE_DATA => PageKind::Data,
            PAGE_TYPE_MIX => PageKind::Mix,
            PAGE_TYPE_AMD => PageKind::Amd,
            PAGE_TYPE_COMP => PageKind::Comp,
            other => PageKind::Unknown(other),
        }
    }

    /// Whether the page carries a subheader pointer table.
    pub fn has_subheaders(self) -> bool {
        matches!(self, PageKind::Meta | PageKind::Mix)
    }
}

#[derive(Debug, Clone)]
pub struct PageHeader {
    pub kind: PageKind,
    pub block_count: u16,
    pub subheader_count: u16,
}

/// Bytes before the page type field: 16 in 32-bit files, 32 in 64-bit files.
pub fn page_bit_offset(is_64bit: bool) -> usize {
    if is_64bit {
        PAGE_BIT_OFFSET_64
    } else {
        PAGE_BIT_OFFSET_32
    }
}

/// Parses the header of one page.
pub fn parse_page_header(
    page: &[u8],
    page_index: u64,
    is_64bit: bool,
    endian: Endian,
) -> Result<PageHeader, SasError> {
    let o = page_bit_offset(is_64bit);
    if page.len() < o + 6 {
        return Err(SasError::MalformedPage {
            page_index,
            message: format!(
                "page too short for its header (need {}, got {})",
                o + 6,
                page.len()
            ),
        });
    }

    Ok(PageHeader {
        kind: PageKind::from_type(endian.u16(page, o)),
        block_count: endian.u16(page, o + 2),
        subheader_count: endian.u16(page, o + 4),
    })
}
