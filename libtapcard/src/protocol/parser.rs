// tapcard-rs/libtapcard/src/protocol/parser.rs

use crate::constants::PN533_CMD_PREFIX_DEVICE;
use crate::{Error, Result};

/// Ensure the slice has at least `min` bytes.
///
/// These helpers read inside payloads that already passed framing, so a
/// short read is a malformed record, not a wire fault.
pub fn ensure_len(data: &[u8], min: usize) -> Result<()> {
    if data.len() < min {
        return Err(Error::MalformedRecord {
            offset: data.len(),
            reason: "record shorter than its layout",
        });
    }
    Ok(())
}

/// Return a subslice with bounds checking.
pub fn slice_at(data: &[u8], idx: usize, len: usize) -> Result<&[u8]> {
    ensure_len(data, idx + len)?;
    Ok(&data[idx..idx + len])
}

/// Read a single byte at `idx` with bounds checking.
pub fn byte_at(data: &[u8], idx: usize) -> Result<u8> {
    ensure_len(data, idx + 1)?;
    Ok(data[idx])
}

/// Check a chip response payload `D5 <cmd+1> ...` and return what follows
/// the two header bytes.
pub fn expect_response(payload: &[u8], cmd: u8) -> Result<&[u8]> {
    let prefix = byte_at(payload, 0)?;
    if prefix != PN533_CMD_PREFIX_DEVICE {
        return Err(Error::UnexpectedResponse {
            expected: PN533_CMD_PREFIX_DEVICE,
            actual: prefix,
        });
    }
    let code = byte_at(payload, 1)?;
    let expected = cmd.wrapping_add(1);
    if code != expected {
        return Err(Error::UnexpectedResponse {
            expected,
            actual: code,
        });
    }
    Ok(&payload[2..])
}
