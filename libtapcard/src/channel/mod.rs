// tapcard-rs/libtapcard/src/channel/mod.rs

//! Exclusive APDU channel to one card.
//!
//! Scheme drivers talk to cards only through [`CardChannel`]. A caller
//! brackets its exchanges with `begin_transaction` / `end_transaction`;
//! the gate waits rather than polls when another caller holds it.

pub mod gate;
pub mod nfc;
#[cfg(feature = "pcsc")]
pub mod pcsc;
pub mod scripted;

pub use gate::TransactionGate;
pub use nfc::NfcChannel;
#[cfg(feature = "pcsc")]
pub use self::pcsc::PcscChannel;
pub use scripted::ScriptedChannel;

use crate::Result;

/// Physical kind of reader behind a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReaderKind {
    Contact,
    Contactless,
    /// SIM / embedded secure element
    Uicc,
}

pub trait CardChannel: Send + Sync {
    /// Send one APDU and return the full response including its status
    /// word. Fails with `NoCard` when no card is connected.
    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>>;

    /// Wait for exclusive access. `Ok(false)` when no card could be
    /// connected; the gate is not held in that case.
    fn begin_transaction(&self) -> Result<bool>;

    /// Release exclusive access. `keep` asks for the card connection to stay
    /// open for a following transaction.
    fn end_transaction(&self, keep: bool) -> Result<()>;

    fn kind(&self) -> ReaderKind;

    fn is_contactless(&self) -> bool {
        self.kind() == ReaderKind::Contactless
    }

    fn is_uicc(&self) -> bool {
        self.kind() == ReaderKind::Uicc
    }

    /// The card has answered in T=0 style (`61xx`) on this channel.
    fn supports_t0(&self) -> bool {
        false
    }
}

/// Whether ending a transaction tears down the card connection.
pub fn should_disconnect(kind: ReaderKind, keep: bool, must_dispose: bool) -> bool {
    must_dispose || (!keep && kind != ReaderKind::Contactless)
}
