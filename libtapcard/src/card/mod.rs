// tapcard-rs/libtapcard/src/card/mod.rs

//! Card schemes and identification.

pub mod apdu;
pub mod calypso;
pub mod emv;
pub mod identify;
pub mod profile;
pub mod retry;
pub mod snapper;

pub use calypso::CalypsoCard;
pub use emv::EmvCard;
pub use identify::{IdentifyState, Identifier, read_card};
pub use profile::{CardProfile, CardSummary, Scheme};
pub use snapper::{IdCenter, SnapperCard};
