// tapcard-rs/libtapcard/src/protocol/checksum.rs

/// Length checksum (NLEN) of a reader frame: `(256 - len) mod 256`
pub fn lcs(len: u8) -> u8 {
    0u8.wrapping_sub(len)
}

/// Data checksum of a reader frame: `(256 - sum(payload) mod 256) mod 256`
pub fn dcs(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0u8.wrapping_sub(sum)
}

/// A payload and its data checksum always sum to zero modulo 256.
pub fn verify_dcs(payload: &[u8], checksum: u8) -> bool {
    payload
        .iter()
        .fold(checksum, |acc, &b| acc.wrapping_add(b))
        == 0
}
