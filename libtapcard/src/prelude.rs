// tapcard-rs/libtapcard/src/prelude.rs

pub use crate::card::{
    CalypsoCard, CardProfile, CardSummary, EmvCard, Identifier, IdentifyState, Scheme,
    SnapperCard, read_card,
};
pub use crate::channel::{CardChannel, NfcChannel, ReaderKind, ScriptedChannel};
pub use crate::config::ReaderConfig;
pub use crate::device::{CardSession, Device, DeviceBuilder, Initialized, Uninitialized};
pub use crate::protocol::{Command, Frame, FrameReader, RfOption};
pub use crate::reload::{PendingReload, ReloadService};
pub use crate::tlv::{TlvCursor, TlvNode};
pub use crate::{Error, FirmwareVersion, Result, StatusWord};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, ms, parse_hex};
