// tapcard-rs/libtapcard/src/transport/traits.rs

use crate::Result;

/// Raw byte pipe to the reader chip. Framing, correlation and retries live
/// above this trait.
pub trait Transport: Send {
    /// Send raw bytes to the device
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive whatever the device has produced, waiting up to `timeout_ms`.
    /// A chunk may hold several frames or part of one.
    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>>;

    /// Perform a transport-level reset
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}
