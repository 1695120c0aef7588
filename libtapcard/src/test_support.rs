//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralise MockTransport scripting of the reader chip so
//! tests across the crate and tests/ directory script the same exchanges.

use crate::device::config::INIT_REGISTERS;
use crate::device::{Device, Initialized};
use crate::transport::MockTransport;
use crate::Result;

/// Firmware response of a PN533 v2.7.
pub const FIRMWARE_RESPONSE: [u8; 6] = [0xD5, 0x03, 0x33, 0x02, 0x07, 0x07];

/// Queue the chip's side of `Device::initialize`: firmware version, then a
/// read-back of 0x00 and a write confirmation for every init register.
#[doc(hidden)]
pub fn script_init(mock: &MockTransport) -> Result<()> {
    mock.push_ack_and_frame(&FIRMWARE_RESPONSE)?;
    for _ in INIT_REGISTERS {
        mock.push_ack_and_frame(&[0xD5, 0x07, 0x00])?;
        mock.push_ack_and_frame(&[0xD5, 0x09])?;
    }
    Ok(())
}

/// InListPassiveTarget answer for a 4-byte UID with an ATS whose T0 does or
/// does not announce TB(1).
#[doc(hidden)]
pub fn select_response(uid: &[u8], has_tb: bool) -> Vec<u8> {
    let t0 = if has_tb { 0x78 } else { 0x58 };
    let mut r = vec![0xD5, 0x4B, 0x01, 0x01, 0x00, 0x04, 0x20, uid.len() as u8];
    r.extend_from_slice(uid);
    r.extend_from_slice(&[0x05, t0, 0x80, 0x70, 0x02]);
    r
}

/// Queue a select answer.
#[doc(hidden)]
pub fn script_select(mock: &MockTransport, response: &[u8]) -> Result<()> {
    mock.push_ack_and_frame(response)
}

/// Queue the chip's wrapping of one card response.
#[doc(hidden)]
pub fn script_card_response(mock: &MockTransport, has_tb: bool, card_resp: &[u8]) -> Result<()> {
    let mut payload = if has_tb {
        vec![0xD5, 0x41, 0x00]
    } else {
        vec![0xD5, 0x43, 0x00, 0x02]
    };
    payload.extend_from_slice(card_resp);
    mock.push_ack_and_frame(&payload)
}

/// Initialise a Device on a scripted MockTransport. The returned mock is a
/// clone sharing the device's transport state.
#[doc(hidden)]
pub fn initialized_mock_device() -> Result<(Device<Initialized>, MockTransport)> {
    let mock = MockTransport::new();
    script_init(&mock)?;
    let device = Device::new_with_transport(Box::new(mock.clone())).initialize()?;
    Ok((device, mock))
}
