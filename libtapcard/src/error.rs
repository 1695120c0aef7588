// tapcard-rs/libtapcard/src/error.rs

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("device not found")]
    DeviceNotFound,

    // Only present with the `usb` feature
    #[cfg(feature = "usb")]
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),

    #[cfg(feature = "pcsc")]
    #[error("pcsc error: {0}")]
    Pcsc(#[from] pcsc::Error),

    #[error("invalid packet length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },
    #[error("frame format error: {0}")]
    FrameFormat(String),

    #[error("malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: &'static str },

    #[error("unexpected response code: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedResponse { expected: u8, actual: u8 },

    #[error("no card present")]
    NoCard,

    #[error("card transaction lost")]
    TransactionLost,

    #[error("a command is already in flight on this channel")]
    Busy,

    #[error("operation timed out")]
    Timeout,

    #[error("reload service error: {0}")]
    Reload(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl Error {
    /// True for wire-level framing violations. These leave the physical
    /// channel unusable and are never retried. `InvalidLength` is only
    /// raised for frame bytes; short card records are `MalformedRecord`.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Error::ChecksumMismatch { .. } | Error::FrameFormat(_) | Error::InvalidLength { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
