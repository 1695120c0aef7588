// tapcard-rs/libtapcard/src/types.rs

use derive_more::Display;

use crate::Error;

/// Trailing status word (SW1 SW2) of a card response.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(fmt = "{:02X}{:02X}", sw1, sw2)]
pub struct StatusWord {
    sw1: u8,
    sw2: u8,
}

impl StatusWord {
    pub const SUCCESS: Self = Self::new(0x90, 0x00);

    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Status word of a raw response: its last two bytes.
    pub fn from_response(resp: &[u8]) -> Option<Self> {
        match resp {
            [.., sw1, sw2] => Some(Self::new(*sw1, *sw2)),
            _ => None,
        }
    }

    pub fn sw1(&self) -> u8 {
        self.sw1
    }

    pub fn sw2(&self) -> u8 {
        self.sw2
    }

    pub fn as_u16(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    /// `61xx`: `xx` more bytes are waiting for GET RESPONSE.
    pub fn more_data(&self) -> Option<u8> {
        (self.sw1 == 0x61).then_some(self.sw2)
    }

    /// `6Cxx` / `67xx`: reissue the command with `Le = xx`.
    pub fn wrong_length(&self) -> Option<u8> {
        matches!(self.sw1, 0x6C | 0x67).then_some(self.sw2)
    }

    /// `6Exx`: feature or file not available (Calypso uses this for
    /// "try the alternate class byte").
    pub fn is_not_available(&self) -> bool {
        self.sw1 == 0x6E
    }
}

impl TryFrom<&[u8]> for StatusWord {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_response(bytes).ok_or(Error::MalformedRecord {
            offset: bytes.len(),
            reason: "no status word",
        })
    }
}

/// PN533 firmware identification from GetFirmwareVersion (`D5 03 IC Ver Rev Support`).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display(fmt = "PN5{:02X} v{}.{}", ic, version, revision)]
pub struct FirmwareVersion {
    pub ic: u8,
    pub version: u8,
    pub revision: u8,
    pub support: u8,
}

impl TryFrom<&[u8]> for FirmwareVersion {
    type Error = Error;

    /// Parse the full response payload including the `D5 03` header.
    fn try_from(payload: &[u8]) -> Result<Self, Self::Error> {
        match payload {
            [0xD5, 0x03, ic, version, revision, support, ..] => Ok(Self {
                ic: *ic,
                version: *version,
                revision: *revision,
                support: *support,
            }),
            [0xD5, 0x03, ..] => Err(Error::MalformedRecord {
                offset: payload.len(),
                reason: "firmware version truncated",
            }),
            _ => Err(Error::UnexpectedResponse {
                expected: 0x03,
                actual: payload.get(1).copied().unwrap_or(0),
            }),
        }
    }
}

/// Response that carries nothing but a status word.
pub fn is_status_only(resp: &[u8]) -> bool {
    resp.len() == 2
}

/// Response that carries data in front of its status word.
pub fn has_data(resp: &[u8]) -> bool {
    resp.len() > 2
}
