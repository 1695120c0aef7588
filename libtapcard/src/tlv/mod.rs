// tapcard-rs/libtapcard/src/tlv/mod.rs

//! BER-TLV cursor over card responses.
//!
//! A [`TlvCursor`] walks the sibling data objects inside one bounded region
//! of a buffer. Each step yields an immutable [`TlvNode`] that knows its tag
//! and value range; constructed values are walked with
//! [`TlvNode::child_cursor`]. Nothing here knows about card schemes.
//!
//! Encoding rules:
//! - the tag is two bytes iff the low five bits of its first byte are all set,
//!   otherwise one byte;
//! - a length byte below `0x80` is the length itself, otherwise its low seven
//!   bits count the big-endian length bytes that follow.
//!
//! A node whose header or value would cross the end of its region is a
//! `MalformedRecord` error, never a truncated node.

use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// One positioned data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvNode<'a> {
    buf: &'a [u8],
    offset: usize,
    tag: u32,
    value_offset: usize,
    value_len: usize,
}

impl<'a> TlvNode<'a> {
    /// Tag value: one byte, or two bytes big-endian (`0x9F38`).
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Offset of the first tag byte within the underlying buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the first value byte within the underlying buffer.
    pub fn data_offset(&self) -> usize {
        self.value_offset
    }

    pub fn data_length(&self) -> usize {
        self.value_len
    }

    /// Offset one past the last value byte.
    pub fn end(&self) -> usize {
        self.value_offset + self.value_len
    }

    pub fn data_bytes(&self) -> &'a [u8] {
        &self.buf[self.value_offset..self.end()]
    }

    /// Upper-case hex rendering of the value.
    pub fn data_as_hex_string(&self) -> String {
        bytes_to_hex(self.data_bytes())
    }

    /// Each value byte mapped to the Unicode code point of the same number.
    pub fn data_as_latin1_string(&self) -> String {
        self.data_bytes().iter().map(|&b| char::from(b)).collect()
    }

    /// Cursor over the nested objects of a constructed value.
    pub fn child_cursor(&self) -> TlvCursor<'a> {
        TlvCursor {
            buf: self.buf,
            start: self.value_offset,
            end: self.end(),
            next: self.value_offset,
            failed: false,
        }
    }
}

/// Cursor over the sibling data objects of one region.
///
/// Iterating yields `Result<TlvNode>`; after the first error the cursor is
/// exhausted.
#[derive(Debug, Clone)]
pub struct TlvCursor<'a> {
    buf: &'a [u8],
    start: usize,
    end: usize,
    next: usize,
    failed: bool,
}

impl<'a> TlvCursor<'a> {
    /// Cursor over the whole buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            start: 0,
            end: buf.len(),
            next: 0,
            failed: false,
        }
    }

    /// Cursor over `length` bytes starting at `offset`.
    pub fn with_range(buf: &'a [u8], offset: usize, length: usize) -> Result<Self> {
        let end = offset
            .checked_add(length)
            .filter(|&e| e <= buf.len())
            .ok_or(Error::MalformedRecord {
                offset,
                reason: "region exceeds buffer",
            })?;
        Ok(Self {
            buf,
            start: offset,
            end,
            next: offset,
            failed: false,
        })
    }

    /// Cursor over a card response with its trailing status word removed.
    pub fn over_response(resp: &'a [u8]) -> Result<Self> {
        let len = resp.len().checked_sub(2).ok_or(Error::MalformedRecord {
            offset: 0,
            reason: "response shorter than a status word",
        })?;
        Self::with_range(resp, 0, len)
    }

    /// Restart from the first object of the region.
    pub fn rewind(&mut self) {
        self.next = self.start;
        self.failed = false;
    }

    /// Advance to the next sibling. `Ok(None)` once the region is exhausted.
    pub fn next_node(&mut self) -> Result<Option<TlvNode<'a>>> {
        if self.failed || self.next >= self.end {
            return Ok(None);
        }
        match self.parse_at(self.next) {
            Ok(node) => {
                self.next = node.end();
                Ok(Some(node))
            }
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    /// Scan forward for the first sibling carrying `tag`.
    pub fn find(&mut self, tag: u32) -> Result<Option<TlvNode<'a>>> {
        while let Some(node) = self.next_node()? {
            if node.tag() == tag {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    fn byte(&self, at: usize) -> Result<u8> {
        if at >= self.end {
            return Err(Error::MalformedRecord {
                offset: at,
                reason: "header runs past end of region",
            });
        }
        Ok(self.buf[at])
    }

    fn parse_at(&self, offset: usize) -> Result<TlvNode<'a>> {
        let b0 = self.byte(offset)?;
        let (tag, tag_len) = if b0 & 0x1F == 0x1F {
            let b1 = self.byte(offset + 1)?;
            (u32::from(b0) << 8 | u32::from(b1), 2)
        } else {
            (u32::from(b0), 1)
        };

        let len_at = offset + tag_len;
        let l0 = self.byte(len_at)?;
        let (value_len, len_len) = if l0 < 0x80 {
            (usize::from(l0), 1)
        } else {
            let count = usize::from(l0 & 0x7F);
            if count > 4 {
                return Err(Error::MalformedRecord {
                    offset: len_at,
                    reason: "length field wider than four bytes",
                });
            }
            let mut v = 0usize;
            for i in 0..count {
                v = (v << 8) | usize::from(self.byte(len_at + 1 + i)?);
            }
            (v, 1 + count)
        };

        let value_offset = len_at + len_len;
        match value_offset.checked_add(value_len) {
            Some(end) if end <= self.end => Ok(TlvNode {
                buf: self.buf,
                offset,
                tag,
                value_offset,
                value_len,
            }),
            _ => Err(Error::MalformedRecord {
                offset,
                reason: "value overruns enclosing region",
            }),
        }
    }
}

impl<'a> Iterator for TlvCursor<'a> {
    type Item = Result<TlvNode<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_node().transpose()
    }
}

/// Follow a path of nested tags from the top of `buf` and return the value of
/// the last one. Each step takes the first matching sibling.
pub fn find_path<'a>(buf: &'a [u8], path: &[u32]) -> Result<Option<&'a [u8]>> {
    let mut cursor = TlvCursor::new(buf);
    let mut found = None;
    for &tag in path {
        match cursor.find(tag)? {
            Some(node) => {
                cursor = node.child_cursor();
                found = Some(node);
            }
            None => return Ok(None),
        }
    }
    Ok(found.map(|n| n.data_bytes()))
}

/// Encode one data object. Tags above `0xFF` are written as two bytes;
/// lengths above `0x7F` use the `0x81`/`0x82` long forms.
pub fn encode(tag: u32, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 5);
    if tag > 0xFF {
        out.push((tag >> 8) as u8);
    }
    out.push(tag as u8);
    match value.len() {
        n if n < 0x80 => out.push(n as u8),
        n if n <= 0xFF => out.extend_from_slice(&[0x81, n as u8]),
        n => out.extend_from_slice(&[0x82, (n >> 8) as u8, n as u8]),
    }
    out.extend_from_slice(value);
    out
}
