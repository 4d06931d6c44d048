//! Observation records.
//!
//! Observations are packed back to back with no separators; each row is as
//! wide as the furthest variable end. The last 80-byte record is padded
//! with spaces, which can look like extra blank rows when rows are short.

use polars::prelude::*;

use super::constants::{MEMBER_HEADER_PREFIX, RECORD_LEN};
use super::ibm::ibm_to_f64;
use super::{decode_text, VariableKind, XportVariable};
use crate::pipeline::values::{build_frame, ColumnBuilder};

/// Width of one observation.
pub fn row_length(variables: &[XportVariable]) -> usize {
    variables
        .iter()
        .map(|v| v.position + v.length)
        .max()
        .unwrap_or(0)
}

/// Cuts the observation block at the next member header, if any.
///
/// Returns the block and whether another member follows.
pub fn split_member(obs: &[u8]) -> (&[u8], bool) {
    let next_member = obs
        .chunks(RECORD_LEN)
        .position(|record| record.starts_with(MEMBER_HEADER_PREFIX));
    match next_member {
        Some(index) => (&obs[..index * RECORD_LEN], true),
        None => (obs, false),
    }
}

/// Number of real rows in an observation block.
pub fn row_count(obs: &[u8], row_len: usize) -> usize {
    if row_len == 0 {
        return 0;
    }
    let last_record = obs.len().saturating_sub(RECORD_LEN);
    let mut count = obs.len() / row_len;
    while count > 0 {
        let start = (count - 1) * row_len;
        let row = &obs[start..start + row_len];
        if start >= last_record && row.iter().all(|&b| b == b' ') {
            count -= 1;
        } else {
            break;
        }
    }
    count
}

/// Decodes all rows of a member into a frame.
pub fn decode_observations(obs: &[u8], variables: &[XportVariable]) -> PolarsResult<DataFrame> {
    let row_len = row_length(variables);
    let rows = row_count(obs, row_len);

    let mut builders: Vec<ColumnBuilder> = variables
        .iter()
        .map(|v| ColumnBuilder::new(v.output_type, rows))
        .collect();

    for row in obs.chunks_exact(row_len.max(1)).take(rows) {
        for (var, builder) in variables.iter().zip(builders.iter_mut()) {
            let bytes = &row[var.position..var.position + var.length];
            match var.kind {
                VariableKind::Numeric => builder.push_number(ibm_to_f64(bytes)),
                VariableKind::Character => builder.push_text(decode_text(bytes)),
            }
        }
    }

    build_frame(
        variables
            .iter()
            .map(|v| v.name.clone())
            .zip(builders)
            .collect(),
    )
}
