//! Record layout constants for SAS transport (XPORT v5/v6) files.

/// Every header and data block is a sequence of 80-byte records.
pub const RECORD_LEN: usize = 80;

/// First record of a version 5/6 transport library.
pub const LIBRARY_HEADER: &[u8; 80] =
    b"HEADER RECORD*******LIBRARY HEADER RECORD!!!!!!!000000000000000000000000000000  ";

/// First record of a version 8/9 transport library.
pub const LIBRARY_V8_PREFIX: &[u8] = b"HEADER RECORD*******LIBV8   HEADER RECORD!!!!!!!";

pub const MEMBER_HEADER_PREFIX: &[u8] = b"HEADER RECORD*******MEMBER  HEADER RECORD!!!!!!!";
pub const DSCRPTR_HEADER_PREFIX: &[u8] = b"HEADER RECORD*******DSCRPTR HEADER RECORD!!!!!!!";
pub const NAMESTR_HEADER_PREFIX: &[u8] = b"HEADER RECORD*******NAMESTR HEADER RECORD!!!!!!!";
pub const OBS_HEADER_PREFIX: &[u8] = b"HEADER RECORD*******OBS     HEADER RECORD!!!!!!!";

// ---------------------------------------------------------------------------
// Real header records (library and member)
// ---------------------------------------------------------------------------

pub const SAS_VERSION_FIELD: (usize, usize) = (24, 32);
pub const OS_FIELD: (usize, usize) = (32, 40);
/// `ddMMMyy:hh:mm:ss`, at the end of the first real header record.
pub const CREATED_FIELD: (usize, usize) = (64, 80);
/// Same layout, at the start of the second real header record.
pub const MODIFIED_FIELD: (usize, usize) = (0, 16);

pub const DATETIME_FORMAT: &str = "%d%b%y:%H:%M:%S";

/// Namestr record length, stored as ASCII digits in the member header.
pub const NAMESTR_LEN_FIELD: (usize, usize) = (74, 78);
pub const NAMESTR_LEN_DEFAULT: usize = 140;
/// VAX/VMS writers use a shorter namestr with the same leading fields.
pub const NAMESTR_LEN_VMS: usize = 136;

pub const MEMBER_NAME_FIELD: (usize, usize) = (8, 16);
pub const MEMBER_LABEL_FIELD: (usize, usize) = (32, 72);
pub const MEMBER_TYPE_FIELD: (usize, usize) = (72, 80);

/// Variable count, as ASCII digits in the NAMESTR header record.
pub const VARIABLE_COUNT_FIELD: (usize, usize) = (54, 58);

// ---------------------------------------------------------------------------
// Namestr fields (big-endian)
// ---------------------------------------------------------------------------

pub const NTYPE_OFFSET: usize = 0;
pub const NLNG_OFFSET: usize = 4;
pub const NVAR0_OFFSET: usize = 6;
pub const NNAME_FIELD: (usize, usize) = (8, 16);
pub const NLABEL_FIELD: (usize, usize) = (16, 56);
pub const NFORM_FIELD: (usize, usize) = (56, 64);
pub const NFL_OFFSET: usize = 64;
pub const NFD_OFFSET: usize = 66;
pub const NPOS_OFFSET: usize = 84;
/// Bytes of a namestr that carry the fields above.
pub const NAMESTR_USED_LEN: usize = 88;

pub const NTYPE_NUMERIC: u16 = 1;
pub const NTYPE_CHARACTER: u16 = 2;

/// Numeric variables occupy 2 to 8 bytes.
pub const MIN_NUMERIC_LEN: usize = 2;
pub const MAX_NUMERIC_LEN: usize = 8;
