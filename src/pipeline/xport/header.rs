//! Library and member header records.

use chrono::NaiveDateTime;

use super::constants::*;
use super::record::Records;
use super::{decode_text, XportError, XportLibrary, XportMember};
use crate::pipeline::bytes::fixed_str;

/// Reads the library header and the two real header records after it.
pub fn parse_library(records: &mut Records<'_>) -> Result<XportLibrary, XportError> {
    let first = records
        .next_record()
        .ok_or(XportError::InvalidLibraryHeader)?;
    if first.starts_with(LIBRARY_V8_PREFIX) {
        return Err(XportError::UnsupportedVersion);
    }
    if first != LIBRARY_HEADER {
        return Err(XportError::InvalidLibraryHeader);
    }

    let (real, second) = real_header_pair(records, "library")?;
    Ok(XportLibrary {
        sas_version: field(real, SAS_VERSION_FIELD),
        os: field(real, OS_FIELD),
        created: parse_datetime(slice(real, CREATED_FIELD)),
        modified: parse_datetime(slice(second, MODIFIED_FIELD)),
    })
}

/// Reads the member and descriptor headers of the next member.
///
/// Returns the member and the namestr record length it declares.
pub fn parse_member(records: &mut Records<'_>) -> Result<(XportMember, usize), XportError> {
    let member_header = records.expect_header(MEMBER_HEADER_PREFIX, "MEMBER")?;
    let namestr_len = match field(member_header, NAMESTR_LEN_FIELD).parse::<usize>() {
        Ok(NAMESTR_LEN_VMS) => NAMESTR_LEN_VMS,
        _ => NAMESTR_LEN_DEFAULT,
    };
    records.expect_header(DSCRPTR_HEADER_PREFIX, "DSCRPTR")?;

    let (real, second) = real_header_pair(records, "member")?;
    let member = XportMember {
        name: field(real, MEMBER_NAME_FIELD),
        label: decode_text(slice(second, MEMBER_LABEL_FIELD)).unwrap_or_default(),
        dataset_type: field(second, MEMBER_TYPE_FIELD),
        sas_version: field(real, SAS_VERSION_FIELD),
        os: field(real, OS_FIELD),
        created: parse_datetime(slice(real, CREATED_FIELD)),
        modified: parse_datetime(slice(second, MODIFIED_FIELD)),
    };
    Ok((member, namestr_len))
}

fn real_header_pair<'a>(
    records: &mut Records<'a>,
    header: &'static str,
) -> Result<(&'a [u8], &'a [u8]), XportError> {
    let offset = records.position();
    match (records.next_record(), records.next_record()) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(XportError::MissingHeader { header, offset }),
    }
}

fn slice(record: &[u8], (start, end): (usize, usize)) -> &[u8] {
    &record[start..end]
}

fn field(record: &[u8], range: (usize, usize)) -> String {
    fixed_str(slice(record, range))
}

/// Parses a `ddMMMyy:hh:mm:ss` timestamp; blank or malformed fields give `None`.
pub fn parse_datetime(bytes: &[u8]) -> Option<NaiveDateTime> {
    let text = std::str::from_utf8(bytes).ok()?.trim();
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).ok()
}
