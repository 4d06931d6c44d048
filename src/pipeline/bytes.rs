//! Byte-order aware integer and float reads over in-memory buffers.
//!
//! Both SAS formats are parsed from byte slices that have already been read
//! from disk (a header prefix, a page, an 80-byte record). Callers check
//! bounds before reading; these helpers index directly.

/// Byte order of multi-byte fields in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn u16(self, data: &[u8], offset: usize) -> u16 {
        let buf = take::<2>(data, offset);
        match self {
            Endian::Little => u16::from_le_bytes(buf),
            Endian::Big => u16::from_be_bytes(buf),
        }
    }

    pub fn i16(self, data: &[u8], offset: usize) -> i16 {
        self.u16(data, offset) as i16
    }

    pub fn u32(self, data: &[u8], offset: usize) -> u32 {
        let buf = take::<4>(data, offset);
        match self {
            Endian::Little => u32::from_le_bytes(buf),
            Endian::Big => u32::from_be_bytes(buf),
        }
    }

    pub fn u64(self, data: &[u8], offset: usize) -> u64 {
        let buf = take::<8>(data, offset);
        match self {
            Endian::Little => u64::from_le_bytes(buf),
            Endian::Big => u64::from_be_bytes(buf),
        }
    }

    pub fn f64(self, data: &[u8], offset: usize) -> f64 {
        f64::from_bits(self.u64(data, offset))
    }

    /// Reads a pointer-sized unsigned value: 8 bytes in 64-bit files, 4 otherwise.
    pub fn word(self, data: &[u8], offset: usize, is_64bit: bool) -> u64 {
        if is_64bit {
            self.u64(data, offset)
        } else {
            self.u32(data, offset) as u64
        }
    }
}

fn take<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&data[offset..offset + N]);
    buf
}

/// Decodes a fixed-width, space- or NUL-padded ASCII field.
pub fn fixed_str(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).trim().to_string()
}
