// tapcard-rs/libtapcard/src/lib.rs

//! libtapcard
//!
//! Pure Rust card identification for PN533 contactless readers and PC/SC
//! contact readers. Recognises EMV payment cards, Calypso transit cards
//! and Snapper stored-value purses.

pub mod card;
pub mod channel;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod reload;
pub mod sequencer;
pub mod test_support;
pub mod tlv;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`
// and the status-word types are available to consumers and to the
// `prelude`.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
