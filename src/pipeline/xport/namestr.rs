//! Variable descriptors (namestr records).

use super::constants::*;
use super::record::Records;
use super::{decode_text, VariableKind, XportError, XportVariable};
use crate::pipeline::bytes::{fixed_str, Endian};
use crate::pipeline::values::{infer_numeric_type, OutputType};

/// Reads the NAMESTR header and the descriptors that follow it.
pub fn parse_variables(
    records: &mut Records<'_>,
    namestr_len: usize,
) -> Result<Vec<XportVariable>, XportError> {
    let header = records.expect_header(NAMESTR_HEADER_PREFIX, "NAMESTR")?;
    let (start, end) = VARIABLE_COUNT_FIELD;
    let count: usize = fixed_str(&header[start..end])
        .parse()
        .map_err(|_| XportError::InvalidNamestr {
            index: 0,
            message: "variable count is not a number".into(),
        })?;

    let variables = (0..count)
        .map(|index| {
            let bytes = records
                .take(namestr_len)
                .ok_or_else(|| XportError::InvalidNamestr {
                    index,
                    message: "file ends inside the variable descriptors".into(),
                })?;
            parse_namestr(bytes, index)
        })
        .collect::<Result<Vec<_>, _>>()?;
    records.align();
    Ok(variables)
}

/// Decodes one namestr record.
pub fn parse_namestr(bytes: &[u8], index: usize) -> Result<XportVariable, XportError> {
    if bytes.len() < NAMESTR_USED_LEN {
        return Err(XportError::InvalidNamestr {
            index,
            message: format!("record is {} bytes", bytes.len()),
        });
    }
    let be = Endian::Big;
    let name = fixed_str(&bytes[NNAME_FIELD.0..NNAME_FIELD.1]);
    let length = be.u16(bytes, NLNG_OFFSET) as usize;

    let kind = match be.u16(bytes, NTYPE_OFFSET) {
        NTYPE_NUMERIC => VariableKind::Numeric,
        NTYPE_CHARACTER => VariableKind::Character,
        other => {
            return Err(XportError::InvalidNamestr {
                index,
                message: format!("unknown variable type {other}"),
            })
        }
    };
    if kind == VariableKind::Numeric && !(MIN_NUMERIC_LEN..=MAX_NUMERIC_LEN).contains(&length) {
        return Err(XportError::UnsupportedLength { name, length });
    }

    let format = display_format(
        &fixed_str(&bytes[NFORM_FIELD.0..NFORM_FIELD.1]),
        be.u16(bytes, NFL_OFFSET),
        be.u16(bytes, NFD_OFFSET),
    );
    let output_type = match kind {
        VariableKind::Character => OutputType::Utf8,
        VariableKind::Numeric => infer_numeric_type(&format),
    };

    Ok(XportVariable {
        number: be.u16(bytes, NVAR0_OFFSET),
        name: if name.is_empty() {
            format!("VAR{}", index + 1)
        } else {
            name
        },
        label: decode_text(&bytes[NLABEL_FIELD.0..NLABEL_FIELD.1]).unwrap_or_default(),
        format,
        kind,
        length,
        position: be.u32(bytes, NPOS_OFFSET) as usize,
        output_type,
    })
}

/// Rebuilds a format such as `DATE9.` or `8.2` from its name, width and decimals.
fn display_format(name: &str, width: u16, decimals: u16) -> String {
    if name.is_empty() && width == 0 {
        return String::new();
    }
    let mut format = name.to_string();
    if width > 0 {
        format.push_str(&width.to_string());
    }
    format.push('.');
    if decimals > 0 {
        format.push_str(&decimals.to_string());
    }
    format
}
