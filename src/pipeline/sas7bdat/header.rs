//! SAS7BDAT file header parsing.
//!
//! The header fixes everything needed to walk the pages: word size, byte
//! order, text encoding, page size and page count. Row and column counts
//! live in subheaders and are read later.

use std::io::{Read, Seek, SeekFrom};

use super::constants::*;
use super::{OsType, SasEncoding, SasError, SasHeader};
use crate::pipeline::bytes::{fixed_str, Endian};

/// Reads and validates the file header.
///
/// # Errors
/// * `SasError::InvalidMagic` - the file does not start with the SAS7BDAT magic number
/// * `SasError::UnsupportedEncoding` - unknown encoding identifier
/// * `SasError::TruncatedFile` - the file is shorter than the declared header
/// * `SasError::InvalidPageSize` - the page size is outside 1 KiB..=16 MiB
pub fn parse_header<R: Read + Seek>(reader: &mut R) -> Result<SasHeader, SasError> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    if file_size < HEADER_PREFIX_LEN as u64 {
        let mut magic = vec![0u8; (file_size as usize).min(SAS_MAGIC.len())];
        reader.read_exact(&mut magic)?;
        if magic.len() < SAS_MAGIC.len() || magic[..] != SAS_MAGIC[..] {
            return Err(SasError::InvalidMagic);
        }
        return Err(SasError::TruncatedFile {
            expected: HEADER_PREFIX_LEN as u64,
            actual: file_size,
        });
    }

    let mut prefix = vec![0u8; HEADER_PREFIX_LEN];
    reader.read_exact(&mut prefix)?;
    let header = parse_header_bytes(&prefix)?;

    if file_size < header.header_length {
        return Err(SasError::TruncatedFile {
            expected: header.header_length,
            actual: file_size,
        });
    }

    Ok(header)
}

/// Parses the header fields from the first [`HEADER_PREFIX_LEN`] bytes of a file.
pub fn parse_header_bytes(data: &[u8]) -> Result<SasHeader, SasError> {
    if data.len() < HEADER_PREFIX_LEN || data[..SAS_MAGIC.len()] != SAS_MAGIC {
        return Err(SasError::InvalidMagic);
    }

    let is_64bit = data[ALIGN1_FLAG_OFFSET] == ALIGN_64BIT;
    let endian = if data[ENDIAN_FLAG_OFFSET] == ENDIAN_LITTLE {
        Endian::Little
    } else {
        Endian::Big
    };

    // Fields up to the page count move with alignment flag 2. Fields after
    // it also move when the page count is an 8-byte word.
    let pad1 = if data[ALIGN2_FLAG_OFFSET] == ALIGN_64BIT { 4 } else { 0 };
    let total_align = pad1 + if is_64bit { 4 } else { 0 };

    let encoding = parse_encoding(data[ENCODING_OFFSET] as u16)?;

    let page_size = endian.u32(data, PAGE_SIZE_BASE + pad1);
    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(SasError::InvalidPageSize { page_size });
    }

    let server_type = &data[SAS_SERVER_TYPE_BASE + total_align..][..16];
    let os_name = &data[OS_NAME_BASE + total_align..][..16];
    let os_type = match detect_os_type(server_type) {
        OsType::Unknown => detect_os_type(os_name),
        known => known,
    };

    Ok(SasHeader {
        is_64bit,
        endian,
        encoding,
        page_size,
        page_count: endian.word(data, PAGE_COUNT_BASE + pad1, is_64bit),
        header_length: endian.u32(data, HEADER_LENGTH_BASE + pad1) as u64,
        dataset_name: fixed_str(&data[DATASET_NAME_OFFSET..][..DATASET_NAME_LEN]),
        created: endian.f64(data, TIMESTAMP_CREATED_BASE + pad1),
        modified: endian.f64(data, TIMESTAMP_MODIFIED_BASE + pad1),
        os_type,
        sas_release: fixed_str(&data[SAS_RELEASE_BASE + total_align..][..8]),
    })
}

fn parse_encoding(id: u16) -> Result<SasEncoding, SasError> {
    if id == 0 {
        return Ok(SasEncoding::Unspecified);
    }
    encoding_label(id)
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .map(|encoding| SasEncoding::Known { id, encoding })
        .ok_or(SasError::UnsupportedEncoding { id })
}

fn detect_os_type(field: &[u8]) -> OsType {
    let name = String::from_utf8_lossy(field).to_uppercase();
    if name.contains("WIN") || name.contains("W32") {
        OsType::Windows
    } else if ["UNIX", "LINUX", "AIX", "SUN", "HP-UX"]
        .iter()
        .any(|os| name.contains(os))
    {
        OsType::Unix
    } else {
        OsType::Unknown
    }
}
