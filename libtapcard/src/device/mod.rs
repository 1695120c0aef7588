// tapcard-rs/libtapcard/src/device/mod.rs

pub mod builder;
pub mod config;
pub mod handle;
pub mod session;

pub use builder::DeviceBuilder;
pub use handle::{Device, Initialized, Uninitialized};
pub use session::CardSession;
