// tapcard-rs/libtapcard/src/protocol/frame.rs

use crate::constants::{ACK_FRAME, FRAME_POSTAMBLE, FRAME_PREAMBLE, MAX_PAYLOAD_LEN, MIN_FRAME_LEN};
use crate::protocol::checksum::{dcs, lcs, verify_dcs};
use crate::{Error, Result};

/// One unit exchanged with the reader chip.
///
/// Data frame: `[00 00 FF] [LEN] [LCS] [payload(LEN)] [DCS] [00]`
/// ACK frame:  `00 00 FF 00 FF 00`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Ack,
    Data(Vec<u8>),
}

impl Frame {
    /// Encode a payload into a full data frame
    pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::InvalidLength {
                expected: MAX_PAYLOAD_LEN,
                actual: payload.len(),
            });
        }

        let len = payload.len() as u8;
        let mut out = Vec::with_capacity(MIN_FRAME_LEN + payload.len());
        out.extend_from_slice(&FRAME_PREAMBLE);
        out.push(len);
        out.push(lcs(len));
        out.extend_from_slice(payload);
        out.push(dcs(payload));
        out.push(FRAME_POSTAMBLE);
        Ok(out)
    }

    /// Decode exactly one frame. The ACK pattern is recognised before any
    /// data-frame validation; every other mismatch is an error.
    pub fn decode(frame: &[u8]) -> Result<Frame> {
        if frame == ACK_FRAME {
            return Ok(Frame::Ack);
        }
        Self::decode_payload(frame).map(Frame::Data)
    }

    /// Decode a data frame and return its payload
    pub fn decode_payload(frame: &[u8]) -> Result<Vec<u8>> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(Error::InvalidLength {
                expected: MIN_FRAME_LEN,
                actual: frame.len(),
            });
        }

        if frame[..3] != FRAME_PREAMBLE {
            return Err(Error::FrameFormat("invalid preamble".into()));
        }

        let len = frame[3];
        let lcs_actual = frame[4];
        let lcs_expected = lcs(len);
        if lcs_actual != lcs_expected {
            return Err(Error::ChecksumMismatch {
                expected: lcs_expected,
                actual: lcs_actual,
            });
        }

        let required_len = MIN_FRAME_LEN + len as usize;
        if frame.len() != required_len {
            return Err(Error::InvalidLength {
                expected: required_len,
                actual: frame.len(),
            });
        }

        let payload_end = 5 + len as usize;
        let payload = &frame[5..payload_end];

        let dcs_actual = frame[payload_end];
        if !verify_dcs(payload, dcs_actual) {
            return Err(Error::ChecksumMismatch {
                expected: dcs(payload),
                actual: dcs_actual,
            });
        }

        if frame[payload_end + 1] != FRAME_POSTAMBLE {
            return Err(Error::FrameFormat("invalid postamble".into()));
        }

        Ok(payload.to_vec())
    }

    /// Wire bytes of this frame
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Frame::Ack => Ok(ACK_FRAME.to_vec()),
            Frame::Data(payload) => Self::encode(payload),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Frame::Ack)
    }

    /// Payload of a data frame, `None` for an ACK
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Frame::Ack => None,
            Frame::Data(p) => Some(p),
        }
    }
}
