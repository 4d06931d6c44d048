//! IBM System/360 hexadecimal floating point.
//!
//! Transport files store numbers as IBM doubles: a sign bit, a 7-bit base-16
//! exponent biased by 64, and a 56-bit fraction. Variables shorter than 8
//! bytes keep the leading bytes. Missing values use a marker byte (`.`,
//! `A`-`Z` or `_`) followed by zeros.

/// Decodes a stored number; missing values come back as `None`.
pub fn ibm_to_f64(bytes: &[u8]) -> Option<f64> {
    if bytes.is_empty() || bytes.len() > 8 || is_missing(bytes) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);

    let negative = buf[0] & 0x80 != 0;
    let exponent = (buf[0] & 0x7F) as i32;
    let fraction = u64::from_be_bytes([0, buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]]);
    if fraction == 0 {
        return Some(0.0);
    }

    let magnitude = fraction as f64 * 2f64.powi(4 * (exponent - 64) - 56);
    Some(if negative { -magnitude } else { magnitude })
}

/// Whether the bytes hold a SAS missing value (`.`, `.A`-`.Z` or `._`).
pub fn is_missing(bytes: &[u8]) -> bool {
    match bytes.split_first() {
        Some((&first, rest)) => {
            (first == b'.' || first == b'_' || first.is_ascii_uppercase())
                && rest.iter().all(|&b| b == 0)
        }
        None => false,
    }
}

/// Encodes a finite number as an IBM double. Returns `None` for NaN,
/// infinities and magnitudes outside the IBM exponent range.
pub fn f64_to_ibm(value: f64) -> Option<[u8; 8]> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some([0; 8]);
    }

    let mut magnitude = value.abs();
    let mut exponent = 64i32;
    while magnitude >= 1.0 {
        magnitude /= 16.0;
        exponent += 1;
    }
    while magnitude < 1.0 / 16.0 {
        magnitude *= 16.0;
        exponent -= 1;
    }

    let mut fraction = (magnitude * 2f64.powi(56)).round() as u64;
    if fraction >= 1 << 56 {
        fraction >>= 4;
        exponent += 1;
    }
    if !(0..=127).contains(&exponent) {
        return None;
    }

    let mut out = fraction.to_be_bytes();
    out[0] = exponent as u8 | if value < 0.0 { 0x80 } else { 0 };
    Some(out)
}
