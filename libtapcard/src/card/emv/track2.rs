// tapcard-rs/libtapcard/src/card/emv/track2.rs

use crate::{Error, Result};

/// Fields of a Track-2 Equivalent Data element (tag `57` / `9F6B`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track2 {
    pub pan: String,
    pub year: u8,
    pub month: u8,
}

/// Decode Track-2 from its hex rendering, e.g.
/// `4111111111111111D25121010000000000`.
///
/// The PAN runs up to the `D` separator; the next two digits are the
/// expiry year and the two after that the month. `Ok(None)` when there is
/// no separator after at least one PAN digit.
pub fn decode(hex: &str) -> Result<Option<Track2>> {
    let sep = match hex.find(['D', 'd']) {
        Some(i) if i > 0 => i,
        _ => return Ok(None),
    };
    let digits = |from: usize| -> Result<u8> {
        hex.get(from..from + 2)
            .and_then(|s| s.parse().ok())
            .ok_or(Error::MalformedRecord {
                offset: from / 2,
                reason: "track 2 expiry is not decimal",
            })
    };
    Ok(Some(Track2 {
        pan: hex[..sep].to_string(),
        year: digits(sep + 1)?,
        month: digits(sep + 3)?,
    }))
}
