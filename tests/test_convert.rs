//! Tests for single-file conversion to Excel workbooks

mod common;

use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use common::*;
use sas2xlsx::pipeline::{
    convert_file, convert_sas7bdat_to_excel, convert_xpt_to_excel, ConversionErrorKind,
};
use tempfile::TempDir;

fn read_sheet(path: &Path) -> Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.worksheet_range("Sheet1").unwrap()
}

/// Serial value of a numeric or date cell.
fn serial(cell: Option<&Data>) -> Option<f64> {
    match cell? {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::DateTime(value) => Some(value.as_f64()),
        _ => None,
    }
}

fn assert_sample_sheet(range: &Range<Data>) {
    assert_eq!(range.get_size(), (4, 3));
    assert_eq!(range.get((0, 0)), Some(&Data::String("AGE".into())));
    assert_eq!(range.get((0, 1)), Some(&Data::String("VISITDT".into())));
    assert_eq!(range.get((0, 2)), Some(&Data::String("NAME".into())));

    assert_eq!(range.get((1, 0)), Some(&Data::Float(34.0)));
    assert_eq!(range.get((2, 0)), Some(&Data::Empty));
    assert_eq!(range.get((3, 0)), Some(&Data::Float(-118.625)));

    assert_eq!(serial(range.get((1, 1))), Some(EXCEL_SERIAL_2020_01_01));
    assert_eq!(serial(range.get((2, 1))), Some(EXCEL_SERIAL_2020_01_01 + 1.0));
    assert_eq!(range.get((3, 1)), Some(&Data::Empty));

    assert_eq!(range.get((1, 2)), Some(&Data::String("Alice".into())));
    assert_eq!(range.get((3, 2)), Some(&Data::Empty));
}

#[test]
fn test_sas7bdat_to_sibling_workbook() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "visits.sas7bdat", &sample_sas7bdat());

    let written = convert_sas7bdat_to_excel(&input, None).unwrap();

    assert_eq!(written, dir.path().join("visits-sas7bdat.xlsx"));
    assert_sample_sheet(&read_sheet(&written));
}

#[test]
fn test_xpt_to_output_directory() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "visits.xpt", &sample_xpt());
    let out = dir.path().join("nested").join("out");

    let written = convert_xpt_to_excel(&input, Some(&out)).unwrap();

    assert_eq!(written, out.join("visits-xpt.xlsx"));
    assert!(written.exists());
    assert_sample_sheet(&read_sheet(&written));
}

#[test]
fn test_explicit_workbook_path() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "visits.xpt", &sample_xpt());
    let target = dir.path().join("report.xlsx");

    let written = convert_file(&input, Some(&target)).unwrap();
    assert_eq!(written, target);
    assert_sample_sheet(&read_sheet(&target));
}

#[test]
fn test_same_stem_different_formats_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let sas = write_file(dir.path(), "dm.sas7bdat", &sample_sas7bdat());
    let xpt = write_file(dir.path(), "dm.xpt", &sample_xpt());

    let a = convert_file(&sas, None).unwrap();
    let b = convert_file(&xpt, None).unwrap();
    assert_ne!(a, b);
    assert!(a.exists() && b.exists());
}

#[test]
fn test_reconversion_overwrites() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "visits.xpt", &sample_xpt());

    let first = convert_file(&input, None).unwrap();
    let second = convert_file(&input, None).unwrap();

    assert_eq!(first, second);
    assert_sample_sheet(&read_sheet(&second));
}

#[test]
fn test_uppercase_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "AE.XPT", &sample_xpt());

    let written = convert_file(&input, None).unwrap();
    assert_eq!(written, dir.path().join("AE-XPT.xlsx"));
}

#[test]
fn test_extreme_numbers_survive_conversion() {
    let dir = TempDir::new().unwrap();
    let cols = vec![Col::num("BIG")];
    let xpt_rows = vec![vec![num(1.0e75)], vec![num(-1.0e75)]];
    let sas_rows = vec![vec![num(f64::MAX)], vec![num(-f64::MAX)]];
    let xpt = write_file(dir.path(), "big.xpt", &build_xpt("BIG", &cols, &xpt_rows));
    let sas = write_file(
        dir.path(),
        "big.sas7bdat",
        &build_sas7bdat("BIG", &cols, &sas_rows),
    );

    let range = read_sheet(&convert_file(&xpt, None).unwrap());
    assert_eq!(range.get((1, 0)), Some(&Data::Float(1.0e75)));
    assert_eq!(range.get((2, 0)), Some(&Data::Float(-1.0e75)));

    let range = read_sheet(&convert_file(&sas, None).unwrap());
    assert_eq!(range.get((1, 0)), Some(&Data::Float(f64::MAX)));
    assert_eq!(range.get((2, 0)), Some(&Data::Float(-f64::MAX)));
}

#[test]
fn test_out_of_range_dates_are_written_as_numbers() {
    let dir = TempDir::new().unwrap();
    let cols = vec![Col::date("D"), Col::datetime("DT"), Col::time("T")];
    let rows = vec![vec![num(1.0e12), num(-1.0e70), num(1.0e70)]];
    let input = write_file(dir.path(), "far.xpt", &build_xpt("FAR", &cols, &rows));

    let range = read_sheet(&convert_file(&input, None).unwrap());

    assert_eq!(range.get_size(), (2, 3));
    assert_eq!(range.get((1, 0)), Some(&Data::Float(1.0e12)));
    assert_eq!(range.get((1, 1)), Some(&Data::Float(-1.0e70)));
    assert_eq!(range.get((1, 2)), Some(&Data::Float(1.0e70)));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "notes.csv", b"a,b\n1,2\n");

    let err = convert_file(&input, None).unwrap_err();
    assert!(matches!(err.kind, ConversionErrorKind::UnsupportedFormat(_)));
    assert_eq!(err.input, input);
}

#[test]
fn test_corrupt_input_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "broken.xpt", b"this is not a transport file");

    let err = convert_xpt_to_excel(&input, None).unwrap_err();
    assert!(matches!(err.kind, ConversionErrorKind::Xport(_)));
    assert!(err.to_string().contains("broken.xpt"));
    assert!(!dir.path().join("broken-xpt.xlsx").exists());
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let err = convert_sas7bdat_to_excel(&dir.path().join("absent.sas7bdat"), None).unwrap_err();
    assert!(matches!(err.kind, ConversionErrorKind::Sas7bdat(_)));
}
