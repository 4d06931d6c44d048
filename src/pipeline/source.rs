//! Source format detection and dispatch to the matching reader.

use std::fmt;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::debug;

use super::error::ConversionErrorKind;
use super::sas7bdat::read_sas7bdat;
use super::xport::read_xport;

/// A supported input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Sas7bdat,
    Xpt,
}

impl SourceFormat {
    /// Batch order: SAS7BDAT files first, then XPT.
    pub const ALL: [SourceFormat; 2] = [SourceFormat::Sas7bdat, SourceFormat::Xpt];

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Sas7bdat => "sas7bdat",
            SourceFormat::Xpt => "xpt",
        }
    }

    /// Detects the format from the file extension, ignoring ASCII case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|f| ext.eq_ignore_ascii_case(f.extension()))
    }

    /// Reads the file into a frame.
    pub fn read(self, path: &Path) -> Result<DataFrame, ConversionErrorKind> {
        match self {
            SourceFormat::Sas7bdat => {
                let dataset = read_sas7bdat(path)?;
                debug!(
                    path = %path.display(),
                    dataset = %dataset.header.dataset_name,
                    created = ?dataset.created(),
                    columns = ?dataset.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                    "Loaded SAS7BDAT file"
                );
                Ok(dataset.frame)
            }
            SourceFormat::Xpt => {
                let dataset = read_xport(path)?;
                let variables: Vec<&str> =
                    dataset.variables.iter().map(|v| v.name.as_str()).collect();
                debug!(
                    path = %path.display(),
                    member = %dataset.member.name,
                    label = %dataset.member.label,
                    created = ?dataset.member.created,
                    ?variables,
                    "Loaded XPT file"
                );
                Ok(dataset.frame)
            }
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
