//! Cursor over the 80-byte records of a transport file.

use super::constants::RECORD_LEN;
use super::XportError;

pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Takes `len` bytes, or `None` if fewer remain.
    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.data.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(bytes)
    }

    pub fn next_record(&mut self) -> Option<&'a [u8]> {
        self.take(RECORD_LEN)
    }

    /// Moves to the start of the next record unless already on a boundary.
    pub fn align(&mut self) {
        let rem = self.pos % RECORD_LEN;
        if rem != 0 {
            self.pos = (self.pos + RECORD_LEN - rem).min(self.data.len());
        }
    }

    /// Takes the next record and checks that it is the named header.
    pub fn expect_header(
        &mut self,
        prefix: &[u8],
        header: &'static str,
    ) -> Result<&'a [u8], XportError> {
        let offset = self.pos;
        match self.next_record() {
            Some(record) if record.starts_with(prefix) => Ok(record),
            _ => Err(XportError::MissingHeader { header, offset }),
        }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}
