//! Pipeline module - reading SAS datasets and writing workbooks

pub mod batch;
pub mod bytes;
pub mod convert;
pub mod error;
pub mod paths;
pub mod sas7bdat;
pub mod source;
pub mod values;
pub mod xlsx;
pub mod xport;

pub use batch::*;
pub use convert::*;
pub use error::*;
pub use paths::resolve_output_path;
pub use source::SourceFormat;
pub use xlsx::{write_xlsx, WriteError};
