//! Big-endian integer and bit-field readers over card records.
//!
//! Every reader is bounds checked and reports `MalformedRecord` instead of
//! reading past the end of the buffer.

use crate::{Error, Result};

/// Read `len` bytes at `off` as a big-endian unsigned integer (`len <= 8`).
pub fn read_be(data: &[u8], off: usize, len: usize) -> Result<u64> {
    if len > 8 {
        return Err(Error::MalformedRecord {
            offset: off,
            reason: "integer wider than 64 bits",
        });
    }
    let bytes = data.get(off..off + len).ok_or(Error::MalformedRecord {
        offset: off,
        reason: "integer runs past end of record",
    })?;
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Read `len` bits starting at bit offset `bit_off`, most significant bit
/// first within each byte (`len <= 64`).
pub fn read_bits(data: &[u8], bit_off: usize, len: usize) -> Result<u64> {
    if len > 64 || bit_off + len > data.len() * 8 {
        return Err(Error::MalformedRecord {
            offset: bit_off / 8,
            reason: "bit field runs past end of record",
        });
    }
    let mut val = 0u64;
    for bit in bit_off..bit_off + len {
        let mask = 0x80u8 >> (bit & 7);
        val = (val << 1) | u64::from(data[bit >> 3] & mask != 0);
    }
    Ok(val)
}

/// Sequential bit-field reader.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read the next `len` bits and advance.
    pub fn read(&mut self, len: usize) -> Result<u64> {
        let v = read_bits(self.data, self.pos, len)?;
        self.pos += len;
        Ok(v)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}
