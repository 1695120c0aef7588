// tapcard-rs/libtapcard/src/card/emv/pdol.rs

//! Processing Options Data Object List handling.
//!
//! A PDOL is a run of tag/length pairs without values. The terminal answers
//! with the concatenated values, in order, inside tag `83`.

use log::debug;
use rand::RngCore;

use crate::config::ReaderConfig;
use crate::tlv;
use crate::{Error, Result};

pub const TAG_AMOUNT_AUTHORISED: u32 = 0x9F02;
pub const TAG_TERMINAL_COUNTRY_CODE: u32 = 0x9F1A;
pub const TAG_TRANSACTION_CURRENCY_CODE: u32 = 0x5F2A;
pub const TAG_TRANSACTION_CURRENCY_CODE_ALT: u32 = 0x9F2A;
pub const TAG_TTQ: u32 = 0x9F66;
pub const TAG_UNPREDICTABLE_NUMBER: u32 = 0x9F37;
pub const TAG_TRANSACTION_DATE: u32 = 0x9A;
pub const TAG_TRANSACTION_TIME: u32 = 0x9F21;

/// Largest value block that still fits a short-Lc GPO once wrapped in `83 81 len`.
pub const MAX_PDOL_DATA: usize = 252;

/// One requested data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdolEntry {
    pub tag: u32,
    pub length: usize,
}

fn malformed(offset: usize, reason: &'static str) -> Error {
    Error::MalformedRecord { offset, reason }
}

/// Split a PDOL into its entries.
pub fn entries(pdol: &[u8]) -> Result<Vec<PdolEntry>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < pdol.len() {
        let tag_len = if pdol[pos] & 0x1F == 0x1F { 2 } else { 1 };
        let tag_bytes = pdol
            .get(pos..pos + tag_len)
            .ok_or_else(|| malformed(pos, "truncated PDOL tag"))?;
        let tag = tag_bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        pos += tag_len;

        let first = *pdol
            .get(pos)
            .ok_or_else(|| malformed(pos, "PDOL entry without length"))?;
        pos += 1;
        let length = if first > 0x7F {
            let n = usize::from(first & 0x7F);
            if n > 4 {
                return Err(malformed(pos, "PDOL length field too wide"));
            }
            let bytes = pdol
                .get(pos..pos + n)
                .ok_or_else(|| malformed(pos, "truncated PDOL length"))?;
            pos += n;
            bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b))
        } else {
            usize::from(first)
        };

        out.push(PdolEntry { tag, length });
    }
    Ok(out)
}

fn total_length(entries: &[PdolEntry]) -> usize {
    entries.iter().fold(0, |acc, e| acc.saturating_add(e.length))
}

/// Total length of the values a PDOL asks for.
pub fn pdol_length(pdol: &[u8]) -> Result<usize> {
    Ok(total_length(&entries(pdol)?))
}

/// Values for every entry of `pdol`, concatenated.
///
/// Country and currency codes, and the terminal transaction qualifiers,
/// come from `config` when the card asks for the standard width. The
/// unpredictable number is filled from `rng`; amounts, dates and anything
/// unrecognised stay zero.
pub fn fill_pdol<R: RngCore + ?Sized>(
    pdol: &[u8],
    config: &ReaderConfig,
    rng: &mut R,
) -> Result<Vec<u8>> {
    let entries = entries(pdol)?;
    let total = total_length(&entries);
    if total > MAX_PDOL_DATA {
        return Err(malformed(0, "PDOL asks for more than a GPO can carry"));
    }
    let mut data = vec![0u8; total];
    let mut pos = 0;

    for entry in entries {
        let field = &mut data[pos..pos + entry.length];
        match (entry.tag, entry.length) {
            (TAG_AMOUNT_AUTHORISED, _) => {}
            (TAG_TERMINAL_COUNTRY_CODE, 2) => field.copy_from_slice(&config.terminal_country_code),
            (TAG_TRANSACTION_CURRENCY_CODE | TAG_TRANSACTION_CURRENCY_CODE_ALT, 2) => {
                field.copy_from_slice(&config.transaction_currency_code)
            }
            (TAG_TTQ, 4) => field.copy_from_slice(&config.terminal_transaction_qualifiers),
            (TAG_UNPREDICTABLE_NUMBER, _) => rng.fill_bytes(field),
            (TAG_TRANSACTION_DATE | TAG_TRANSACTION_TIME, _) => {}
            (tag, len) => debug!("PDOL tag {:X} ignored, len={}", tag, len),
        }
        pos += entry.length;
    }
    Ok(data)
}

/// Command data for GET PROCESSING OPTIONS: `83 len values`, or `83 00`
/// when the card has no PDOL.
pub fn gpo_data<R: RngCore + ?Sized>(
    pdol: Option<&[u8]>,
    config: &ReaderConfig,
    rng: &mut R,
) -> Result<Vec<u8>> {
    let values = match pdol {
        Some(pdol) => fill_pdol(pdol, config, rng)?,
        None => Vec::new(),
    };
    Ok(tlv::encode(0x83, &values))
}
