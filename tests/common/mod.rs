//! Shared test utilities: in-memory SAS7BDAT and XPT file builders

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sas2xlsx::pipeline::xport::ibm::f64_to_ibm;
use tempfile::TempDir;

/// SAS day count of 2020-01-01.
pub const SAS_DATE_2020_01_01: f64 = 21915.0;

/// Excel serial of 2020-01-01.
pub const EXCEL_SERIAL_2020_01_01: f64 = 43831.0;

/// One value in a fixture row.
#[derive(Debug, Clone)]
pub enum Cell {
    Num(f64),
    Missing,
    /// Special missing value such as `.A` or `._`, given by its marker byte.
    Special(u8),
    Text(String),
}

pub fn num(value: f64) -> Cell {
    Cell::Num(value)
}

pub fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

/// A fixture column: numeric (8 bytes) or character (`length` bytes).
#[derive(Debug, Clone)]
pub struct Col {
    pub name: String,
    pub label: String,
    pub format: String,
    pub format_width: u16,
    pub text_len: Option<usize>,
}

impl Col {
    pub fn num(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: String::new(),
            format: String::new(),
            format_width: 0,
            text_len: None,
        }
    }

    pub fn date(name: &str) -> Self {
        Self {
            format: "DATE".to_string(),
            format_width: 9,
            ..Self::num(name)
        }
    }

    pub fn datetime(name: &str) -> Self {
        Self {
            format: "DATETIME".to_string(),
            format_width: 20,
            ..Self::num(name)
        }
    }

    pub fn time(name: &str) -> Self {
        Self {
            format: "TIME".to_string(),
            format_width: 8,
            ..Self::num(name)
        }
    }

    pub fn text(name: &str, length: usize) -> Self {
        Self {
            text_len: Some(length),
            ..Self::num(name)
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    fn width(&self) -> usize {
        self.text_len.unwrap_or(8)
    }
}

fn pad_to(bytes: &mut Vec<u8>, len: usize, fill: u8) {
    if bytes.len() < len {
        bytes.resize(len, fill);
    }
}

fn text_field(value: &str, width: usize) -> Vec<u8> {
    let mut bytes = value.as_bytes()[..value.len().min(width)].to_vec();
    pad_to(&mut bytes, width, b' ');
    bytes
}

// ---------------------------------------------------------------------------
// XPT
// ---------------------------------------------------------------------------

const XPT_LIBRARY_HEADER: &[u8] =
    b"HEADER RECORD*******LIBRARY HEADER RECORD!!!!!!!000000000000000000000000000000  ";

fn xpt_record(fields: &[(usize, &[u8])]) -> Vec<u8> {
    let mut record = vec![b' '; 80];
    for (at, bytes) in fields {
        record[*at..*at + bytes.len()].copy_from_slice(bytes);
    }
    record
}

fn xpt_member(name: &str, label: &str, cols: &[Col], rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(xpt_record(&[(
        0,
        b"HEADER RECORD*******MEMBER  HEADER RECORD!!!!!!!000000000000000001600000000140  ",
    )]));
    out.extend(xpt_record(&[(
        0,
        b"HEADER RECORD*******DSCRPTR HEADER RECORD!!!!!!!000000000000000000000000000000  ",
    )]));
    out.extend(xpt_record(&[
        (0, b"SAS     "),
        (8, &text_field(name, 8)),
        (16, b"SASDATA 9.4     X64_10PR"),
        (64, b"01JAN24:00:00:00"),
    ]));
    out.extend(xpt_record(&[
        (0, b"01JAN24:00:00:00"),
        (32, &text_field(label, 40)),
        (72, b"DATA    "),
    ]));

    let count = format!("{:04}", cols.len());
    out.extend(xpt_record(&[
        (0, b"HEADER RECORD*******NAMESTR HEADER RECORD!!!!!!!000000"),
        (54, count.as_bytes()),
        (58, b"00000000000000000000"),
    ]));

    let mut namestrs = Vec::new();
    let mut position = 0usize;
    for (index, col) in cols.iter().enumerate() {
        let mut entry = vec![0u8; 140];
        let ntype: u16 = if col.text_len.is_some() { 2 } else { 1 };
        entry[0..2].copy_from_slice(&ntype.to_be_bytes());
        entry[4..6].copy_from_slice(&(col.width() as u16).to_be_bytes());
        entry[6..8].copy_from_slice(&(index as u16 + 1).to_be_bytes());
        entry[8..16].copy_from_slice(&text_field(&col.name, 8));
        entry[16..56].copy_from_slice(&text_field(&col.label, 40));
        entry[56..64].copy_from_slice(&text_field(&col.format, 8));
        entry[64..66].copy_from_slice(&col.format_width.to_be_bytes());
        entry[72..80].copy_from_slice(&text_field("", 8));
        entry[84..88].copy_from_slice(&(position as u32).to_be_bytes());
        position += col.width();
        namestrs.extend(entry);
    }
    let padded = namestrs.len().div_ceil(80) * 80;
    pad_to(&mut namestrs, padded, b' ');
    out.extend(namestrs);

    out.extend(xpt_record(&[(
        0,
        b"HEADER RECORD*******OBS     HEADER RECORD!!!!!!!000000000000000000000000000000  ",
    )]));

    let mut obs = Vec::new();
    for row in rows {
        for (col, cell) in cols.iter().zip(row) {
            match cell {
                Cell::Num(value) => obs.extend(f64_to_ibm(*value).expect("encodable number")),
                Cell::Missing => obs.extend([b'.', 0, 0, 0, 0, 0, 0, 0]),
                Cell::Special(marker) => obs.extend([*marker, 0, 0, 0, 0, 0, 0, 0]),
                Cell::Text(value) => obs.extend(text_field(value, col.width())),
            }
        }
    }
    let padded = obs.len().div_ceil(80) * 80;
    pad_to(&mut obs, padded, b' ');
    out.extend(obs);
    out
}

/// Builds a version 5 transport file holding one member.
pub fn build_xpt(name: &str, cols: &[Col], rows: &[Vec<Cell>]) -> Vec<u8> {
    build_xpt_members(&[(name, cols, rows)])
}

/// Builds a transport file with several members.
pub fn build_xpt_members(members: &[(&str, &[Col], &[Vec<Cell>])]) -> Vec<u8> {
    let mut out = XPT_LIBRARY_HEADER.to_vec();
    out.extend(xpt_record(&[
        (0, b"SAS     SAS     SASLIB  9.4     X64_10PR"),
        (64, b"01JAN24:00:00:00"),
    ]));
    out.extend(xpt_record(&[(0, b"01JAN24:00:00:00")]));
    for (name, cols, rows) in members {
        out.extend(xpt_member(name, "", cols, rows));
    }
    out
}

// ---------------------------------------------------------------------------
// SAS7BDAT (64-bit little-endian)
// ---------------------------------------------------------------------------

const SAS_MAGIC: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc2, 0xea, 0x81, 0x60,
    0xb3, 0x14, 0x11, 0xcf, 0xbd, 0x92, 0x08, 0x00, 0x09, 0xc7, 0x31, 0x8c, 0x18, 0x1f, 0x10, 0x11,
];

const HEADER_LEN: usize = 1024;
pub const PAGE_SIZE: usize = 4096;
const PAGE_HEADER_END: usize = 40;
const POINTER_LEN: usize = 24;

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn sas_header(name: &str, page_count: u64) -> Vec<u8> {
    let mut header = vec![0u8; HEADER_LEN];
    header[..32].copy_from_slice(&SAS_MAGIC);
    header[32] = 0x33;
    header[35] = 0x33;
    header[37] = 0x01;
    header[70] = 20;
    header[92..92 + name.len()].copy_from_slice(name.as_bytes());
    header[168..176].copy_from_slice(&(1_893_456_000.0f64).to_le_bytes());
    header[176..184].copy_from_slice(&(1_893_456_000.0f64).to_le_bytes());
    put_u32(&mut header, 200, HEADER_LEN as u32);
    put_u32(&mut header, 204, PAGE_SIZE as u32);
    put_u64(&mut header, 208, page_count);
    header[224..232].copy_from_slice(b"9.0401M6");
    header[232..240].copy_from_slice(b"X64_10PR");
    header
}

/// A subheader with the pointer flags it is written with.
struct Subheader {
    bytes: Vec<u8>,
    compression: u8,
    kind: u8,
}

impl Subheader {
    fn meta(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            compression: 0,
            kind: 0,
        }
    }
}

/// Column text block plus references into it.
struct TextBlock {
    bytes: Vec<u8>,
}

impl TextBlock {
    fn new(compressed: bool) -> Self {
        let mut bytes = vec![0u8; 32];
        if compressed {
            bytes[12..20].copy_from_slice(b"SASYZCRL");
        }
        Self { bytes }
    }

    /// Appends text and returns (offset, length).
    fn push(&mut self, value: &str) -> (u16, u16) {
        if value.is_empty() {
            return (0, 0);
        }
        let offset = self.bytes.len();
        self.bytes.extend(value.as_bytes());
        let padded = self.bytes.len().div_ceil(4) * 4;
        pad_to(&mut self.bytes, padded, b' ');
        (offset as u16, value.len() as u16)
    }
}

fn put_text_ref(buf: &mut [u8], at: usize, (offset, length): (u16, u16)) {
    put_u16(buf, at, 0);
    put_u16(buf, at + 2, offset);
    put_u16(buf, at + 4, length);
}

fn encode_sas_row(cols: &[Col], row: &[Cell]) -> Vec<u8> {
    let mut out = Vec::new();
    for (col, cell) in cols.iter().zip(row) {
        match cell {
            Cell::Num(value) => out.extend(value.to_le_bytes()),
            Cell::Missing | Cell::Special(_) => out.extend([0, 0, 0, 0, 0, 0xFE, 0xFF, 0xFF]),
            Cell::Text(value) => out.extend(text_field(value, col.width())),
        }
    }
    out
}

/// Run-length encodes a row with literal copies and trailing-space runs.
fn rle_encode(row: &[u8]) -> Vec<u8> {
    let trailing = row.iter().rev().take_while(|&&b| b == b' ').count();
    let (body, mut spaces) = if trailing >= 2 {
        (&row[..row.len() - trailing], trailing)
    } else {
        (row, 0)
    };

    let mut out = Vec::new();
    for chunk in body.chunks(16) {
        out.push(0x80 | (chunk.len() as u8 - 1));
        out.extend(chunk);
    }
    while spaces >= 2 {
        let run = spaces.min(17);
        out.push(0xE0 | (run as u8 - 2));
        spaces -= run;
    }
    if spaces == 1 {
        out.extend([0x80, b' ']);
    }
    out
}

fn meta_subheaders(
    cols: &[Col],
    row_length: usize,
    row_count: usize,
    compressed: bool,
) -> Vec<Subheader> {
    let n = cols.len();

    let mut row_size = vec![0u8; 128];
    put_u32(&mut row_size, 0, 0xF7F7_F7F7);
    put_u64(&mut row_size, 40, row_length as u64);
    put_u64(&mut row_size, 48, row_count as u64);

    let mut col_size = vec![0u8; 24];
    put_u32(&mut col_size, 0, 0xF6F6_F6F6);
    put_u64(&mut col_size, 8, n as u64);

    let mut text = TextBlock::new(compressed);
    let names: Vec<_> = cols.iter().map(|c| text.push(&c.name)).collect();
    let formats: Vec<_> = cols.iter().map(|c| text.push(&c.format)).collect();
    let labels: Vec<_> = cols.iter().map(|c| text.push(&c.label)).collect();

    let mut column_text = vec![0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
    column_text.extend(&text.bytes);

    let mut column_names = vec![0u8; 16 + 8 * n + 12];
    put_u32(&mut column_names, 0, 0xFFFF_FFFF);
    for (i, name) in names.iter().enumerate() {
        put_text_ref(&mut column_names, 16 + 8 * i, *name);
    }

    let mut column_attrs = vec![0u8; 16 + 16 * n + 12];
    put_u32(&mut column_attrs, 0, 0xFFFF_FFFC);
    let mut offset = 0u64;
    for (i, col) in cols.iter().enumerate() {
        let at = 16 + 16 * i;
        put_u64(&mut column_attrs, at, offset);
        put_u32(&mut column_attrs, at + 8, col.width() as u32);
        column_attrs[at + 14] = if col.text_len.is_some() { 2 } else { 1 };
        offset += col.width() as u64;
    }

    let mut subheaders = vec![
        Subheader::meta(row_size),
        Subheader::meta(col_size),
        Subheader::meta(column_text),
        Subheader::meta(column_names),
        Subheader::meta(column_attrs),
    ];
    for (format, label) in formats.iter().zip(&labels) {
        let mut entry = vec![0u8; 64];
        entry[..8].copy_from_slice(&[0xFE, 0xFB, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        put_text_ref(&mut entry, 46, *format);
        put_text_ref(&mut entry, 52, *label);
        subheaders.push(Subheader::meta(entry));
    }
    subheaders
}

fn meta_page(subheaders: &[Subheader]) -> Vec<u8> {
    let mut page = vec![0u8; PAGE_SIZE];
    put_u16(&mut page, 32, 0x0000);
    put_u16(&mut page, 34, subheaders.len() as u16);
    put_u16(&mut page, 36, subheaders.len() as u16);

    let mut data_at = (PAGE_HEADER_END + subheaders.len() * POINTER_LEN).div_ceil(8) * 8;
    for (i, subheader) in subheaders.iter().enumerate() {
        let pointer = PAGE_HEADER_END + i * POINTER_LEN;
        assert!(
            data_at + subheader.bytes.len() <= PAGE_SIZE,
            "fixture metadata does not fit one page"
        );
        put_u64(&mut page, pointer, data_at as u64);
        put_u64(&mut page, pointer + 8, subheader.bytes.len() as u64);
        page[pointer + 16] = subheader.compression;
        page[pointer + 17] = subheader.kind;
        page[data_at..data_at + subheader.bytes.len()].copy_from_slice(&subheader.bytes);
        data_at = (data_at + subheader.bytes.len()).div_ceil(8) * 8;
    }
    page
}

fn data_page(rows: &[Vec<u8>]) -> Vec<u8> {
    let mut page = vec![0u8; PAGE_SIZE];
    put_u16(&mut page, 32, 0x0100);
    put_u16(&mut page, 34, rows.len() as u16);
    let mut at = PAGE_HEADER_END;
    for row in rows {
        page[at..at + row.len()].copy_from_slice(row);
        at += row.len();
    }
    page
}

/// Builds an uncompressed SAS7BDAT file; rows spill over as many data pages
/// as needed.
pub fn build_sas7bdat(name: &str, cols: &[Col], rows: &[Vec<Cell>]) -> Vec<u8> {
    let row_length: usize = cols.iter().map(Col::width).sum();
    let encoded: Vec<Vec<u8>> = rows.iter().map(|r| encode_sas_row(cols, r)).collect();
    let per_page = (PAGE_SIZE - PAGE_HEADER_END) / row_length.max(1);

    let mut pages = vec![meta_page(&meta_subheaders(cols, row_length, rows.len(), false))];
    pages.extend(encoded.chunks(per_page.max(1)).map(data_page));

    let mut out = sas_header(name, pages.len() as u64);
    out.extend(pages.concat());
    out
}

/// Builds an RLE-compressed SAS7BDAT file with all rows on the metadata page.
pub fn build_sas7bdat_rle(name: &str, cols: &[Col], rows: &[Vec<Cell>]) -> Vec<u8> {
    let row_length: usize = cols.iter().map(Col::width).sum();
    let mut subheaders = meta_subheaders(cols, row_length, rows.len(), true);
    subheaders.extend(rows.iter().map(|row| Subheader {
        bytes: rle_encode(&encode_sas_row(cols, row)),
        compression: 4,
        kind: 1,
    }));

    let mut out = sas_header(name, 1);
    out.extend(meta_page(&subheaders));
    out
}

/// Overwrites the row length declared in the row size subheader, which the
/// builders always place first on the first page.
pub fn set_sas7bdat_row_length(file: &mut [u8], row_length: u64) {
    let page = HEADER_LEN;
    let mut offset = [0u8; 8];
    offset.copy_from_slice(&file[page + PAGE_HEADER_END..page + PAGE_HEADER_END + 8]);
    let at = page + u64::from_le_bytes(offset) as usize + 40;
    put_u64(file, at, row_length);
}

// ---------------------------------------------------------------------------
// Files on disk
// ---------------------------------------------------------------------------

/// Writes `bytes` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Columns and rows shared by most tests: a number, a date and a name.
pub fn sample_table() -> (Vec<Col>, Vec<Vec<Cell>>) {
    let cols = vec![
        Col::num("AGE").label("Age in years"),
        Col::date("VISITDT").label("Visit date"),
        Col::text("NAME", 8),
    ];
    let rows = vec![
        vec![num(34.0), num(SAS_DATE_2020_01_01), text("Alice")],
        vec![Cell::Missing, num(SAS_DATE_2020_01_01 + 1.0), text("Bob")],
        vec![num(-118.625), Cell::Missing, text("")],
    ];
    (cols, rows)
}

pub fn sample_sas7bdat() -> Vec<u8> {
    let (cols, rows) = sample_table();
    build_sas7bdat("SAMPLE", &cols, &rows)
}

pub fn sample_xpt() -> Vec<u8> {
    let (cols, rows) = sample_table();
    build_xpt("SAMPLE", &cols, &rows)
}

/// A temp dir holding `a.sas7bdat`, `b.xpt` and an unrelated `c.txt`.
pub fn mixed_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.sas7bdat", &sample_sas7bdat());
    write_file(dir.path(), "b.xpt", &sample_xpt());
    write_file(dir.path(), "c.txt", b"not a dataset");
    dir
}
