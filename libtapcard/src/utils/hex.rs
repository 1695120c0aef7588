//! Hexadecimal helpers used for card data rendering and trace output.
//!
//! Card data (PANs, Track-2, purse identities) is conventionally shown as
//! upper-case hex, so that is what `bytes_to_hex` produces. The parser
//! tolerates whitespace and either case.

/// Convert a byte slice to an upper-case hex string without separators.
///
/// Example: `&[0xde, 0xad]` -> `"DEAD"`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    ::hex::encode_upper(bytes)
}

/// Convert a byte slice to an upper-case hex string with a single space
/// between each byte. Used for trace logging of frames.
///
/// Example: `&[0xde, 0xad]` -> `"DE AD"`
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a hex string into bytes.
///
/// Accepts strings with or without ASCII whitespace. Returns an error message
/// string on parse failure.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    ::hex::decode(&cleaned).map_err(|e| format!("invalid hex '{}': {}", cleaned, e))
}
