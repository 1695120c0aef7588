// tapcard-rs/libtapcard/src/protocol/mod.rs

pub mod checksum;
pub mod commands;
pub mod frame;
pub mod parser;
pub mod stream;

pub use checksum::{dcs, lcs};
pub use commands::{Command, RfOption, is_response};
pub use frame::Frame;
pub use stream::FrameReader;
