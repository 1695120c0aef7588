// tapcard-rs/libtapcard/src/utils/timeout.rs

use std::time::Duration;

/// How long one bulk read from the reader chip may block before the
/// sequencer treats the chip as silent.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
