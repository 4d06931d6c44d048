//! Decompression for SAS7BDAT compressed rows.
//!
//! SAS7BDAT files use one of two schemes, announced by the column text
//! subheader:
//! - **RLE** (`SASYZCRL`): control bytes whose high nibble selects a copy or
//!   fill command and whose low nibble extends its length.
//! - **RDC** (`SASYZCR2`, Ross Data Compression): 16-bit control words, one
//!   bit per item, selecting literals or run/back-reference commands.
//!
//! Each compressed row expands to exactly the dataset's row length.

use thiserror::Error;

/// Upper bound on the up-front allocation; larger rows grow as bytes arrive.
const MAX_INITIAL_CAPACITY: usize = 1 << 16;

/// Why a compressed block could not be expanded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecompressError {
    #[error("premature end of input at byte {position}")]
    InputExhausted { position: usize },

    #[error("output overflow: {requested} bytes requested with {remaining} remaining")]
    Overflow { requested: usize, remaining: usize },

    #[error("unknown RLE command 0x{command:X} at byte {position}")]
    UnknownCommand { command: u8, position: usize },

    #[error("invalid back-reference: offset {offset} at output position {position}")]
    InvalidBackReference { offset: usize, position: usize },

    #[error("output length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Reads compressed input while tracking the position for error reports.
struct Input<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Input<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, DecompressError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(DecompressError::InputExhausted { position: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn slice(&mut self, count: usize) -> Result<&'a [u8], DecompressError> {
        let end = self.pos + count;
        if end > self.data.len() {
            return Err(DecompressError::InputExhausted { position: self.pos });
        }
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }
}

/// Output buffer that refuses to grow past the expected length.
struct Output {
    buf: Vec<u8>,
    limit: usize,
}

impl Output {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(limit.min(MAX_INITIAL_CAPACITY)),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.buf.len() >= self.limit
    }

    fn reserve(&self, count: usize) -> Result<(), DecompressError> {
        let remaining = self.limit - self.buf.len();
        if count > remaining {
            return Err(DecompressError::Overflow {
                requested: count,
                remaining,
            });
        }
        Ok(())
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), DecompressError> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn fill(&mut self, byte: u8, count: usize) -> Result<(), DecompressError> {
        self.reserve(count)?;
        self.buf.extend(std::iter::repeat_n(byte, count));
        Ok(())
    }

    /// Copies `count` bytes starting `offset` bytes back. Overlap is allowed,
    /// so offset 1 repeats the previous byte.
    fn back_reference(&mut self, offset: usize, count: usize) -> Result<(), DecompressError> {
        let position = self.buf.len();
        if offset == 0 || offset > position {
            return Err(DecompressError::InvalidBackReference { offset, position });
        }
        self.reserve(count)?;
        let start = position - offset;
        for i in 0..count {
            let b = self.buf[start + i];
            self.buf.push(b);
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, DecompressError> {
        if self.buf.len() != self.limit {
            return Err(DecompressError::LengthMismatch {
                expected: self.limit,
                actual: self.buf.len(),
            });
        }
        Ok(self.buf)
    }
}

/// Expands an RLE-compressed block to exactly `output_length` bytes.
pub fn decompress_rle(input: &[u8], output_length: usize) -> Result<Vec<u8>, DecompressError> {
    let mut input = Input::new(input);
    let mut out = Output::new(output_length);

    while !out.is_full() {
        let control = input.byte()?;
        let command = control >> 4;
        let length = (control & 0x0F) as usize;

        match command {
            0x0 => {
                let count = input.byte()? as usize + 64 + length * 256;
                out.extend(input.slice(count)?)?;
            }
            0x1 => {
                let count = input.byte()? as usize + 64 + length * 256 + 4096;
                out.extend(input.slice(count)?)?;
            }
            0x2 => out.extend(input.slice(length + 96)?)?,
            0x4 => {
                let count = input.byte()? as usize + 18 + length * 256;
                let fill = input.byte()?;
                out.fill(fill, count)?;
            }
            0x5 => {
                let count = input.byte()? as usize + 17 + length * 256;
                out.fill(b'@', count)?;
            }
            0x6 => {
                let count = input.byte()? as usize + 17 + length * 256;
                out.fill(b' ', count)?;
            }
            0x7 => {
                let count = input.byte()? as usize + 17 + length * 256;
                out.fill(0x00, count)?;
            }
            0x8 => out.extend(input.slice(length + 1)?)?,
            0x9 => out.extend(input.slice(length + 17)?)?,
            0xA => out.extend(input.slice(length + 33)?)?,
            0xB => out.extend(input.slice(length + 49)?)?,
            0xC => {
                let fill = input.byte()?;
                out.fill(fill, length + 3)?;
            }
            0xD => out.fill(b'@', length + 2)?,
            0xE => out.fill(b' ', length + 2)?,
            0xF => out.fill(0x00, length + 2)?,
            _ => {
                return Err(DecompressError::UnknownCommand {
                    command,
                    position: input.pos - 1,
                })
            }
        }
    }

    out.finish()
}

/// Expands an RDC-compressed block to exactly `output_length` bytes.
pub fn decompress_rdc(input: &[u8], output_length: usize) -> Result<Vec<u8>, DecompressError> {
    let mut input = Input::new(input);
    let mut out = Output::new(output_length);

    while !out.is_full() {
        let control = u16::from_be_bytes([input.byte()?, input.byte()?]);

        for bit in (0..16).rev() {
            if out.is_full() {
                break;
            }

            if (control >> bit) & 1 == 0 {
                out.extend(input.slice(1)?)?;
                continue;
            }

            let command_byte = input.byte()?;
            let cnt = (command_byte & 0x0F) as usize;

            match command_byte >> 4 {
                // short run
                0 => {
                    let fill = input.byte()?;
                    out.fill(fill, cnt + 3)?;
                }
                // long run
                1 => {
                    let fill = input.byte()?;
                    let extra = input.byte()? as usize;
                    out.fill(fill, cnt + extra * 16 + 19)?;
                }
                // long back-reference
                2 => {
                    let offset = cnt * 256 + input.byte()? as usize;
                    let count = input.byte()? as usize + 16;
                    out.back_reference(offset, count)?;
                }
                // short back-reference, the command nibble is the length
                length => {
                    let offset = cnt * 256 + input.byte()? as usize;
                    out.back_reference(offset, length as usize)?;
                }
            }
        }
    }

    out.finish()
}
