// tapcard-rs/libtapcard/src/protocol/stream.rs

//! Reassembly of frames from the raw inbound byte stream.
//!
//! The chip's endpoint may hand back an ACK and a data frame in one read,
//! or split a data frame across several reads. [`FrameReader`] buffers what
//! it is given and yields complete frames in order.

use log::trace;

use crate::constants::{ACK_FRAME, FRAME_PREAMBLE, MIN_FRAME_LEN};
use crate::protocol::checksum::lcs;
use crate::protocol::frame::Frame;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one inbound chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        trace!("rx {}", bytes_to_hex(chunk));
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes received but not yet consumed as a frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Take the next complete frame off the buffer.
    ///
    /// `Ok(None)` means more bytes are needed. On a framing error the buffer
    /// is discarded since there is no way to resynchronise on this protocol.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.split_next() {
            Ok(Some(n)) => {
                let bytes: Vec<u8> = self.buf.drain(..n).collect();
                match Frame::decode(&bytes) {
                    Ok(frame) => Ok(Some(frame)),
                    Err(e) => {
                        self.buf.clear();
                        Err(e)
                    }
                }
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.buf.clear();
                Err(e)
            }
        }
    }

    /// Drain every complete frame currently buffered.
    pub fn drain_frames(&mut self) -> Result<Vec<Frame>> {
        let mut out = Vec::new();
        while let Some(f) = self.next_frame()? {
            out.push(f);
        }
        Ok(out)
    }

    /// Size of the next whole frame in the buffer, if it is all there.
    fn split_next(&self) -> Result<Option<usize>> {
        let b = &self.buf;
        if b.is_empty() {
            return Ok(None);
        }
        if b.starts_with(&ACK_FRAME) {
            return Ok(Some(ACK_FRAME.len()));
        }
        if b.len() < ACK_FRAME.len() && ACK_FRAME.starts_with(b) {
            return Ok(None);
        }

        let head = b.len().min(FRAME_PREAMBLE.len());
        if b[..head] != FRAME_PREAMBLE[..head] {
            return Err(Error::FrameFormat(format!(
                "invalid preamble: {}",
                bytes_to_hex(&b[..head])
            )));
        }
        if b.len() < 5 {
            return Ok(None);
        }

        let len = b[3];
        if b[4] != lcs(len) {
            return Err(Error::ChecksumMismatch {
                expected: lcs(len),
                actual: b[4],
            });
        }

        let total = MIN_FRAME_LEN + len as usize;
        if b.len() < total {
            return Ok(None);
        }
        Ok(Some(total))
    }
}
