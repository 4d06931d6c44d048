//! Binary layout constants for SAS7BDAT files.

// ---------------------------------------------------------------------------
// File header
// ---------------------------------------------------------------------------

/// 32-byte magic number at the start of every SAS7BDAT file.
pub const SAS_MAGIC: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc2, 0xea, 0x81, 0x60,
    0xb3, 0x14, 0x11, 0xcf, 0xbd, 0x92, 0x08, 0x00, 0x09, 0xc7, 0x31, 0x8c, 0x18, 0x1f, 0x10, 0x11,
];

/// Alignment flag 1: `0x33` marks a 64-bit file (8-byte words).
pub const ALIGN1_FLAG_OFFSET: usize = 32;

/// Alignment flag 2: `0x33` shifts fields from offset 164 onwards by 4 bytes.
pub const ALIGN2_FLAG_OFFSET: usize = 35;

pub const ALIGN_64BIT: u8 = 0x33;

pub const ENDIAN_FLAG_OFFSET: usize = 37;
pub const ENDIAN_LITTLE: u8 = 0x01;

pub const ENCODING_OFFSET: usize = 70;

pub const DATASET_NAME_OFFSET: usize = 92;
pub const DATASET_NAME_LEN: usize = 64;

// Fields below are shifted by the alignment-2 padding.
pub const TIMESTAMP_CREATED_BASE: usize = 164;
pub const TIMESTAMP_MODIFIED_BASE: usize = 172;
pub const HEADER_LENGTH_BASE: usize = 196;
pub const PAGE_SIZE_BASE: usize = 200;
pub const PAGE_COUNT_BASE: usize = 204;

// Fields below also move by 4 when the page count is a 64-bit word.
pub const SAS_RELEASE_BASE: usize = 216;
pub const SAS_SERVER_TYPE_BASE: usize = 224;
pub const OS_NAME_BASE: usize = 256;

/// Bytes of the header needed to read every field above, for the widest layout.
pub const HEADER_PREFIX_LEN: usize = OS_NAME_BASE + 8 + 16;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Bytes before the page header fields in 32-bit files.
pub const PAGE_BIT_OFFSET_32: usize = 16;

/// Bytes before the page header fields in 64-bit files.
pub const PAGE_BIT_OFFSET_64: usize = 32;

/// Page type, block count, subheader count and two bytes of padding.
pub const PAGE_HEADER_FIELDS_LEN: usize = 8;

/// Page sizes accepted from the header; SAS writes 1 KiB to 16 MiB pages.
pub const MIN_PAGE_SIZE: u32 = 1 << 10;
pub const MAX_PAGE_SIZE: u32 = 1 << 24;

pub const PAGE_TYPE_META: u16 = 0x0000;
pub const PAGE_TYPE_DATA: u16 = 0x0100;
pub const PAGE_TYPE_MIX: u16 = 0x0200;
pub const PAGE_TYPE_AMD: u16 = 0x0400;
pub const PAGE_TYPE_META2: u16 = 0x4000;
pub const PAGE_TYPE_COMP: u16 = 0x9000;

// ---------------------------------------------------------------------------
// Subheaders
// ---------------------------------------------------------------------------
//
// Signatures are read as a u32 in file byte order. In 64-bit big-endian files
// the sign-extended signature puts 0xFFFFFFFF first and the distinguishing
// word second.

pub const SIG_ROWSIZE: u32 = 0xF7F7_F7F7;
pub const SIG_COLUMNSIZE: u32 = 0xF6F6_F6F6;
pub const SIG_COLUMNTEXT: u32 = 0xFFFF_FFFD;
pub const SIG_COLUMNNAME: u32 = 0xFFFF_FFFF;
pub const SIG_COLUMNATTRS: u32 = 0xFFFF_FFFC;
pub const SIG_FORMAT: u32 = 0xFFFF_FBFE;

/// Pointer compression flag for a truncated (ignorable) entry.
pub const POINTER_TRUNCATED: u8 = 1;

/// Pointer type flag for a compressed data row.
pub const POINTER_TYPE_ROW: u8 = 1;

/// Offset of the compression literal within the first column text block.
pub const COMPRESSION_LITERAL_OFFSET: usize = 12;

pub const COMPRESSION_SIGNATURE_RLE: [u8; 8] = *b"SASYZCRL";
pub const COMPRESSION_SIGNATURE_RDC: [u8; 8] = *b"SASYZCR2";

/// Maps a SAS encoding identifier to a WHATWG label understood by `encoding_rs`.
pub fn encoding_label(id: u16) -> Option<&'static str> {
    match id {
        20 => Some("utf-8"),
        28 => Some("us-ascii"),
        29 => Some("iso-8859-1"),
        33 => Some("iso-8859-2"),
        34 => Some("iso-8859-3"),
        35 => Some("iso-8859-4"),
        36 => Some("iso-8859-5"),
        37 => Some("iso-8859-6"),
        38 => Some("iso-8859-7"),
        39 => Some("iso-8859-8"),
        40 => Some("iso-8859-9"),
        60 => Some("windows-1250"),
        61 => Some("windows-1251"),
        62 => Some("windows-1252"),
        63 => Some("windows-1253"),
        64 => Some("windows-1254"),
        65 => Some("windows-1255"),
        66 => Some("windows-1256"),
        67 => Some("windows-1257"),
        68 => Some("windows-1258"),
        123 => Some("big5"),
        125 => Some("gbk"),
        134 => Some("euc-jp"),
        138 => Some("shift_jis"),
        140 => Some("euc-kr"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_labels_resolve() {
        for id in [20, 28, 29, 62, 125, 138] {
            let label = encoding_label(id).unwrap();
            assert!(
                encoding_rs::Encoding::for_label(label.as_bytes()).is_some(),
                "label {label} for id {id} is unknown to encoding_rs"
            );
        }
        assert!(encoding_label(9999).is_none());
    }
}
