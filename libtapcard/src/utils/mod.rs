//! Utilities for libtapcard: small, reusable helpers used across the crate.
//!
//! Hex rendering for card data and logs, big-endian and bit-field readers
//! for card records, display formatting and timeout conversion.

pub mod bits;
pub mod format;
pub mod hex;
pub mod timeout;

// Re-export the most common helpers at the `utils` module level so callers can
// use `crate::utils::bytes_to_hex(...)` etc if they prefer.
pub use self::bits::*;
pub use self::format::*;
pub use self::hex::*;
pub use self::timeout::*;
