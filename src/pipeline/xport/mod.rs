//! SAS transport (XPORT version 5/6) reader.
//!
//! # Module Structure
//!
//! - `constants` - Header record texts and field positions
//! - `error` - Error types for parsing failures
//! - `record` - Cursor over 80-byte records
//! - `header` - Library and member headers
//! - `namestr` - Variable descriptors
//! - `ibm` - IBM hexadecimal floating point
//! - `data` - Observation decoding
//!
//! Only the first member of a library is read.

pub mod constants;
pub mod data;
pub mod error;
pub mod header;
pub mod ibm;
pub mod namestr;
pub mod record;

pub use error::XportError;

use std::path::Path;

use chrono::NaiveDateTime;
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;
use tracing::{debug, warn};

use self::constants::OBS_HEADER_PREFIX;
use self::data::{decode_observations, split_member};
use self::header::{parse_library, parse_member};
use self::namestr::parse_variables;
use self::record::Records;
use crate::pipeline::values::OutputType;

/// Reads a `.xpt` file into a data frame.
pub fn read_xport(path: &Path) -> Result<XportDataset, XportError> {
    let bytes = std::fs::read(path)?;
    parse_xport(&bytes)
}

/// Parses transport file content already in memory.
pub fn parse_xport(data: &[u8]) -> Result<XportDataset, XportError> {
    let mut records = Records::new(data);
    let library = parse_library(&mut records)?;
    let (member, namestr_len) = parse_member(&mut records)?;
    let variables = parse_variables(&mut records, namestr_len)?;
    if variables.is_empty() {
        return Err(XportError::NoVariables);
    }
    records.expect_header(OBS_HEADER_PREFIX, "OBS")?;

    let (obs, more_members) = split_member(records.remaining());
    if more_members {
        warn!(
            member = %member.name,
            "XPORT library holds more than one member; only the first is converted"
        );
    }

    let frame = decode_observations(obs, &variables)?;
    debug!(
        member = %member.name,
        rows = frame.height(),
        variables = variables.len(),
        "Read XPORT member"
    );

    Ok(XportDataset {
        library,
        member,
        variables,
        frame,
    })
}

/// Decodes a padded text field: UTF-8 when valid, Windows-1252 otherwise.
/// Blank fields come back as `None`.
pub(crate) fn decode_text(bytes: &[u8]) -> Option<String> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    };
    let trimmed = text.trim_end_matches([' ', '\0']);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Library-level metadata from the first header records.
#[derive(Debug, Clone)]
pub struct XportLibrary {
    pub sas_version: String,
    pub os: String,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

/// The dataset described by a member header.
#[derive(Debug, Clone)]
pub struct XportMember {
    pub name: String,
    pub label: String,
    /// Usually `DATA`.
    pub dataset_type: String,
    pub sas_version: String,
    pub os: String,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Numeric,
    Character,
}

/// One variable of a member.
#[derive(Debug, Clone)]
pub struct XportVariable {
    pub name: String,
    pub label: String,
    /// Display format such as `DATE9.`; empty when none is set.
    pub format: String,
    pub kind: VariableKind,
    /// Bytes per observation.
    pub length: usize,
    /// Byte offset within an observation.
    pub position: usize,
    /// Variable number as stored.
    pub number: u16,
    pub output_type: OutputType,
}

/// A decoded transport file.
#[derive(Debug, Clone)]
pub struct XportDataset {
    pub library: XportLibrary,
    pub member: XportMember,
    pub variables: Vec<XportVariable>,
    pub frame: DataFrame,
}
