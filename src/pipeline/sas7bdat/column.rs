//! Column metadata assembled from subheader state.

use super::subheader::{SubheaderState, TextRef};
use super::{SasColumn, SasDataType, SasEncoding};
use crate::pipeline::values::{infer_numeric_type, OutputType};

/// Builds the column list in file order.
///
/// Names and attributes are paired by position; a file that declares fewer
/// columns in its column size subheader is cut to that count. Columns
/// without a format subheader get an empty format and label.
pub fn build_columns(state: &SubheaderState, encoding: SasEncoding) -> Vec<SasColumn> {
    let mut count = state.names.len().min(state.attrs.len());
    if state.column_count > 0 {
        count = count.min(state.column_count as usize);
    }

    (0..count)
        .map(|i| {
            let attrs = &state.attrs[i];
            let name = resolve_text(&state.text_blocks, state.names[i], encoding);
            let (format, label) = state
                .formats
                .get(i)
                .map(|f| {
                    (
                        resolve_text(&state.text_blocks, f.format, encoding),
                        resolve_text(&state.text_blocks, f.label, encoding),
                    )
                })
                .unwrap_or_default();

            let output_type = match attrs.data_type {
                SasDataType::Character => OutputType::Utf8,
                SasDataType::Numeric => infer_numeric_type(&format),
            };

            SasColumn {
                name: if name.is_empty() {
                    format!("COL{}", i + 1)
                } else {
                    name
                },
                data_type: attrs.data_type,
                offset: attrs.offset,
                length: attrs.length,
                format,
                label,
                output_type,
            }
        })
        .collect()
}

/// Looks up referenced text; references outside the blocks resolve to "".
fn resolve_text(blocks: &[Vec<u8>], text: TextRef, encoding: SasEncoding) -> String {
    if text.length == 0 {
        return String::new();
    }
    let start = text.offset as usize;
    let end = start + text.length as usize;
    blocks
        .get(text.block as usize)
        .and_then(|block| block.get(start..end))
        .map(|bytes| encoding.decode(bytes).trim().to_string())
        .unwrap_or_default()
}
