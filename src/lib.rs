//! sas2xlsx: SAS dataset to Excel conversion library
//!
//! Reads SAS7BDAT and SAS transport (XPT) files into Polars data frames and
//! writes them as `.xlsx` workbooks, one file or a whole folder at a time.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
