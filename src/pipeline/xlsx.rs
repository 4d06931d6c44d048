//! Writes a data frame to the first sheet of an `.xlsx` workbook.
//!
//! The first row holds the column names in bold; data follows in frame order
//! with no index column. Nulls become empty cells.

use std::path::Path;

use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;

/// Data rows that fit below the header row.
pub const MAX_DATA_ROWS: usize = 1_048_575;
pub const MAX_COLUMNS: usize = 16_384;

pub const SHEET_NAME: &str = "Sheet1";

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const TIME_FORMAT: &str = "hh:mm:ss";

/// Excel serial number of 1970-01-01.
const UNIX_EPOCH_SERIAL: f64 = 25_569.0;
/// Serials below this precede Excel's phantom 1900-02-29.
const FIRST_SERIAL_AFTER_LEAP_BUG: f64 = 61.0;
/// Serial of 10000-01-01; Excel stops at 9999-12-31.
const END_OF_EXCEL_CALENDAR: f64 = 2_958_466.0;
const MS_PER_DAY: f64 = 86_400_000.0;
const NS_PER_DAY: f64 = 86_400_000_000_000.0;
/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("{rows} rows exceed the sheet limit of {MAX_DATA_ROWS}")]
    TooManyRows { rows: usize },

    #[error("{columns} columns exceed the sheet limit of {MAX_COLUMNS}")]
    TooManyColumns { columns: usize },

    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Failed to read column data: {0}")]
    Frame(#[from] PolarsError),
}

/// Writes `frame` to `path`, replacing any existing file.
///
/// The sheet limits are checked before anything is written.
pub fn write_xlsx(frame: &DataFrame, path: &Path) -> Result<(), WriteError> {
    let (rows, columns) = frame.shape();
    if rows > MAX_DATA_ROWS {
        return Err(WriteError::TooManyRows { rows });
    }
    if columns > MAX_COLUMNS {
        return Err(WriteError::TooManyColumns { columns });
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let formats = CellFormats::new();
    for (index, column) in frame.get_columns().iter().enumerate() {
        let col = index as u16;
        worksheet.write_string_with_format(0, col, column.name().as_str(), &formats.header)?;
        write_column(worksheet, col, column.as_materialized_series(), &formats)?;
    }

    workbook.save(path)?;
    Ok(())
}

struct CellFormats {
    header: Format,
    date: Format,
    datetime: Format,
    time: Format,
}

impl CellFormats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            date: Format::new().set_num_format(DATE_FORMAT),
            datetime: Format::new().set_num_format(DATETIME_FORMAT),
            time: Format::new().set_num_format(TIME_FORMAT),
        }
    }
}

fn write_column(
    sheet: &mut Worksheet,
    col: u16,
    series: &Series,
    formats: &CellFormats,
) -> Result<(), WriteError> {
    match series.dtype() {
        DataType::Float32
        | DataType::Float64
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let values = series.cast(&DataType::Float64)?;
            for (row, value) in rows(values.f64()?.into_iter()) {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    sheet.write_number(row, col, v)?;
                }
            }
        }
        DataType::String => {
            for (row, value) in rows(series.str()?.into_iter()) {
                if let Some(s) = value {
                    sheet.write_string(row, col, s)?;
                }
            }
        }
        DataType::Boolean => {
            for (row, value) in rows(series.bool()?.into_iter()) {
                if let Some(b) = value {
                    sheet.write_boolean(row, col, b)?;
                }
            }
        }
        DataType::Date => {
            let physical = series.to_physical_repr();
            for (row, value) in rows(physical.i32()?.into_iter()) {
                let Some(days) = value else { continue };
                if let Some(serial) = excel_serial(days as f64) {
                    sheet.write_number_with_format(row, col, serial, &formats.date)?;
                } else if let Some(text) = iso_date(days) {
                    sheet.write_string(row, col, text)?;
                } else {
                    sheet.write_number(row, col, days as f64)?;
                }
            }
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical = series.to_physical_repr();
            for (row, value) in rows(physical.i64()?.into_iter()) {
                let Some(raw) = value else { continue };
                let ms = to_millis(raw, unit);
                if let Some(serial) = excel_serial(ms as f64 / MS_PER_DAY) {
                    sheet.write_number_with_format(row, col, serial, &formats.datetime)?;
                } else if let Some(text) = iso_datetime(ms) {
                    sheet.write_string(row, col, text)?;
                } else {
                    sheet.write_number(row, col, raw as f64)?;
                }
            }
        }
        DataType::Time => {
            let physical = series.to_physical_repr();
            for (row, value) in rows(physical.i64()?.into_iter()) {
                if let Some(ns) = value {
                    let fraction = ns as f64 / NS_PER_DAY;
                    sheet.write_number_with_format(row, col, fraction, &formats.time)?;
                }
            }
        }
        _ => {
            let text = series.cast(&DataType::String)?;
            for (row, value) in rows(text.str()?.into_iter()) {
                if let Some(s) = value {
                    sheet.write_string(row, col, s)?;
                }
            }
        }
    }
    Ok(())
}

/// Pairs values with their sheet row, below the header.
fn rows<T>(values: impl Iterator<Item = T>) -> impl Iterator<Item = (u32, T)> {
    values.enumerate().map(|(i, v)| (i as u32 + 1, v))
}

/// Converts days since 1970-01-01 to an Excel 1900-system serial.
///
/// Returns `None` outside 1900-01-01..=9999-12-31, which Excel cannot
/// represent.
fn excel_serial(unix_days: f64) -> Option<f64> {
    let mut serial = unix_days + UNIX_EPOCH_SERIAL;
    if serial < FIRST_SERIAL_AFTER_LEAP_BUG {
        serial -= 1.0;
    }
    (1.0..END_OF_EXCEL_CALENDAR).contains(&serial).then_some(serial)
}

fn to_millis(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Milliseconds => value,
        TimeUnit::Microseconds => value.div_euclid(1_000),
        TimeUnit::Nanoseconds => value.div_euclid(1_000_000),
    }
}

fn iso_date(unix_days: i32) -> Option<String> {
    let days = unix_days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(days).map(|d| d.format("%Y-%m-%d").to_string())
}

fn iso_datetime(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
}
