// tapcard-rs/libtapcard/src/card/retry.rs

//! Bounded reissue on wrong-length status words.
//!
//! Each helper resends a command at most once. A card that keeps answering
//! `6Cxx` gets its second answer handed back unchanged.

use log::debug;

use crate::channel::CardChannel;
use crate::types::StatusWord;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// Status-only answer carrying a wrong-length status word, and its `Le`.
fn wrong_length(resp: &[u8]) -> Option<u8> {
    if resp.len() != 2 {
        return None;
    }
    StatusWord::from_response(resp).and_then(|sw| sw.wrong_length())
}

/// `67xx` / `6Cxx` on a case-4 command: resend header and data with `Le = xx`
/// appended.
pub fn handle_67_6c(ch: &dyn CardChannel, apdu: &[u8], resp: Vec<u8>) -> Result<Vec<u8>> {
    let Some(le) = wrong_length(&resp) else {
        return Ok(resp);
    };
    let lc = apdu.get(4).copied().ok_or(Error::MalformedRecord {
        offset: apdu.len(),
        reason: "command has no Lc",
    })? as usize;
    let body = apdu.get(..5 + lc).ok_or(Error::MalformedRecord {
        offset: apdu.len(),
        reason: "command shorter than its Lc",
    })?;

    let mut retry = Vec::with_capacity(body.len() + 1);
    retry.extend_from_slice(body);
    retry.push(le);
    debug!("status {}, resending {}", bytes_to_hex(&resp), bytes_to_hex(&retry));
    ch.transmit(&retry)
}

/// `6Cxx` on a case-2 command: resend with `P3 = xx`.
pub fn retry_short_read(ch: &dyn CardChannel, apdu: &[u8], resp: Vec<u8>) -> Result<Vec<u8>> {
    match resp.as_slice() {
        [0x6C, le] if apdu.len() >= 5 => {
            let mut retry = apdu.to_vec();
            retry[4] = *le;
            debug!("short read, resending with Le {:#04x}", le);
            ch.transmit(&retry)
        }
        _ => Ok(resp),
    }
}

/// Send a case-2 command, reissuing once on `6Cxx`.
pub fn transmit_read(ch: &dyn CardChannel, apdu: &[u8]) -> Result<Vec<u8>> {
    let resp = ch.transmit(apdu)?;
    retry_short_read(ch, apdu, resp)
}
