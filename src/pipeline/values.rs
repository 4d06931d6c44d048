//! Column values shared by the SAS7BDAT and XPORT readers.
//!
//! Both formats store numbers as doubles (IEEE or IBM) and text as padded
//! byte fields; date, datetime and time values are numbers whose display
//! format says how to read them. Readers push raw SAS values into a
//! [`ColumnBuilder`], which converts to Polars dtypes when the column is
//! finished.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use tracing::warn;

/// Days between the SAS epoch (1960-01-01) and the Unix epoch (1970-01-01).
pub const SAS_EPOCH_OFFSET_DAYS: i64 = 3653;

/// Seconds between the SAS epoch and the Unix epoch.
pub const SAS_EPOCH_OFFSET_SECONDS: i64 = 315_619_200;

const SECONDS_PER_DAY: i64 = 86_400;
const MS_PER_SECOND: f64 = 1_000.0;
const NS_PER_SECOND: f64 = 1_000_000_000.0;

/// Formats whose values count days since 1960-01-01.
const DATE_FORMATS: &[&str] = &[
    "DATE", "DAY", "DDMMYY", "DDMMYYB", "DDMMYYC", "DDMMYYD", "DDMMYYN", "DDMMYYP", "DDMMYYS",
    "DOWNAME", "E8601DA", "B8601DA", "JULDAY", "JULIAN", "MINGUO", "MMDDYY", "MMDDYYB", "MMDDYYC",
    "MMDDYYD", "MMDDYYN", "MMDDYYP", "MMDDYYS", "MMYY", "MMYYC", "MMYYD", "MMYYN", "MMYYP",
    "MMYYS", "MONNAME", "MONTH", "MONYY", "NENGO", "QTR", "QTRR", "WEEKDATE", "WEEKDATX",
    "WEEKDAY", "WEEKV", "WORDDATE", "WORDDATX", "YEAR", "YYMM", "YYMMC", "YYMMD", "YYMMN",
    "YYMMP", "YYMMS", "YYMMDD", "YYMMDDB", "YYMMDDC", "YYMMDDD", "YYMMDDN", "YYMMDDP", "YYMMDDS",
    "YYMON", "YYQ", "YYQC", "YYQD", "YYQN", "YYQP", "YYQR", "YYQRC", "YYQRD", "YYQRN", "YYQRP",
    "YYQRS", "YYQS",
];

/// Formats whose values count seconds since 1960-01-01 00:00:00.
const DATETIME_FORMATS: &[&str] = &[
    "DATETIME", "DATEAMPM", "DTDATE", "DTMONYY", "DTWKDATX", "DTYEAR", "MDYAMPM", "B8601DN",
    "B8601DT", "B8601DX", "B8601DZ", "B8601LX", "E8601DN", "E8601DT", "E8601DX", "E8601DZ",
    "E8601LX",
];

/// Formats whose values count seconds since midnight.
const TIME_FORMATS: &[&str] = &[
    "TIME", "TIMEAMPM", "HHMM", "HOUR", "MMSS", "TOD", "E8601TM", "B8601TM",
];

/// Polars dtype a column is materialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Float64,
    Date,
    Datetime,
    Time,
    Utf8,
}

/// Strips width and decimal specifiers from a SAS format (`DATE9.` becomes `DATE`).
pub fn format_family(format: &str) -> String {
    format
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '.')
        .to_ascii_uppercase()
}

/// Chooses the output dtype of a numeric column from its display format.
pub fn infer_numeric_type(format: &str) -> OutputType {
    let family = format_family(format);
    let family = family.as_str();
    if family.is_empty() {
        OutputType::Float64
    } else if DATE_FORMATS.contains(&family) {
        OutputType::Date
    } else if DATETIME_FORMATS.contains(&family) {
        OutputType::Datetime
    } else if TIME_FORMATS.contains(&family) {
        OutputType::Time
    } else {
        OutputType::Float64
    }
}

/// Converts SAS datetime seconds to a naive timestamp, for header metadata.
pub fn sas_seconds_to_datetime(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let unix = seconds - SAS_EPOCH_OFFSET_SECONDS as f64;
    let secs = unix.floor();
    let nanos = ((unix - secs) * NS_PER_SECOND) as u32;
    DateTime::from_timestamp(secs as i64, nanos).map(|dt| dt.naive_utc())
}

/// Accumulates one column's values in row order.
#[derive(Debug, Clone)]
pub enum ColumnBuilder {
    /// Raw SAS numbers, converted according to `output` on finish.
    Numeric {
        output: OutputType,
        values: Vec<Option<f64>>,
    },
    Text(Vec<Option<String>>),
}

impl ColumnBuilder {
    pub fn new(output: OutputType, capacity: usize) -> Self {
        match output {
            OutputType::Utf8 => ColumnBuilder::Text(Vec::with_capacity(capacity)),
            output => ColumnBuilder::Numeric {
                output,
                values: Vec::with_capacity(capacity),
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnBuilder::Numeric { values, .. } => values.len(),
            ColumnBuilder::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a number; `None` is a missing value. Pushing a number into a
    /// text column stores null.
    pub fn push_number(&mut self, value: Option<f64>) {
        match self {
            ColumnBuilder::Numeric { values, .. } => values.push(value.filter(|v| !v.is_nan())),
            ColumnBuilder::Text(values) => values.push(None),
        }
    }

    /// Appends text; `None` is a missing value. Pushing text into a numeric
    /// column stores null.
    pub fn push_text(&mut self, value: Option<String>) {
        match self {
            ColumnBuilder::Numeric { values, .. } => values.push(None),
            ColumnBuilder::Text(values) => values.push(value),
        }
    }

    /// Builds the named Polars column.
    pub fn finish(self, name: &str) -> PolarsResult<Column> {
        let series = match self {
            ColumnBuilder::Text(values) => {
                let ca: StringChunked = values.iter().map(|v| v.as_deref()).collect();
                ca.with_name(name.into()).into_series()
            }
            ColumnBuilder::Numeric { output, values } => match output {
                OutputType::Float64 | OutputType::Utf8 => float_series(name, values),
                OutputType::Date => match convert_all(&values, sas_days_to_unix) {
                    Some(days) => Int32Chunked::from_iter(days)
                        .with_name(name.into())
                        .into_series()
                        .cast(&DataType::Date)?,
                    None => out_of_range(name, output, values),
                },
                OutputType::Datetime => match convert_all(&values, sas_seconds_to_unix_ms) {
                    Some(ms) => Int64Chunked::from_iter(ms)
                        .with_name(name.into())
                        .into_series()
                        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
                    None => out_of_range(name, output, values),
                },
                OutputType::Time => match convert_all(&values, sas_seconds_to_ns) {
                    Some(ns) => Int64Chunked::from_iter(ns)
                        .with_name(name.into())
                        .into_series()
                        .cast(&DataType::Time)?,
                    None => out_of_range(name, output, values),
                },
            },
        };
        Ok(series.into())
    }
}

fn float_series(name: &str, values: Vec<Option<f64>>) -> Series {
    let ca: Float64Chunked = values.into_iter().collect();
    ca.with_name(name.into()).into_series()
}

/// Keeps the raw SAS numbers of a temporal column holding a value that has
/// no calendar representation.
fn out_of_range(name: &str, output: OutputType, values: Vec<Option<f64>>) -> Series {
    warn!(
        column = name,
        ?output,
        "Values outside the supported date range; keeping raw SAS numbers"
    );
    float_series(name, values)
}

/// Applies `convert` to every present value; `None` if any value fails.
fn convert_all<T>(
    values: &[Option<f64>],
    convert: impl Fn(f64) -> Option<T>,
) -> Option<Vec<Option<T>>> {
    values
        .iter()
        .map(|value| match value {
            Some(v) => convert(*v).map(Some),
            None => Some(None),
        })
        .collect()
}

/// Truncates a whole-valued float to `i64` when it is in range.
fn to_i64(value: f64) -> Option<i64> {
    (value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64)
        .then_some(value as i64)
}

fn sas_days_to_unix(days: f64) -> Option<i32> {
    let unix = to_i64(days.floor())?.checked_sub(SAS_EPOCH_OFFSET_DAYS)?;
    let unix = i32::try_from(unix).ok()?;
    DateTime::from_timestamp(i64::from(unix) * SECONDS_PER_DAY, 0).map(|_| unix)
}

fn sas_seconds_to_unix_ms(seconds: f64) -> Option<i64> {
    let ms = to_i64(((seconds - SAS_EPOCH_OFFSET_SECONDS as f64) * MS_PER_SECOND).round())?;
    DateTime::from_timestamp_millis(ms).map(|_| ms)
}

fn sas_seconds_to_ns(seconds: f64) -> Option<i64> {
    to_i64((seconds * NS_PER_SECOND).round())
}

/// Assembles finished columns into a frame, keeping column order.
pub fn build_frame(columns: Vec<(String, ColumnBuilder)>) -> PolarsResult<DataFrame> {
    let columns = columns
        .into_iter()
        .map(|(name, builder)| builder.finish(&name))
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}
