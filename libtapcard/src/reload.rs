// tapcard-rs/libtapcard/src/reload.rs

//! Stored-value reload against an external reload service.
//!
//! The service owns the keys. This side only relays card bytes to it as
//! base64 of upper-case hex, and sends the credit command it returns to
//! the card.

use base64::prelude::*;
use log::{debug, info};

use crate::card::snapper::SnapperCard;
use crate::card::{apdu, retry};
use crate::channel::CardChannel;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// Header of the purse's CREDIT command.
pub const CARD_CREDIT_HEADER: [u8; 5] = [0x90, 0x42, 0x00, 0x00, 0x10];

const PURSE_RECORD_LEN: usize = 0x1A;
const PURSE_RECORD_TYPE: u8 = 2;

/// A paid-for reload waiting to be written to a card.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingReload {
    /// Service-side transaction id.
    pub umtc: String,
    pub amount_cents: u32,
}

/// Remote side of a reload.
pub trait ReloadService {
    /// Reloads already paid for the purse with this identity (hex).
    fn pending_reloads(&self, purse_id: &str) -> Result<Vec<PendingReload>>;

    /// Hand over the purse info and the INITIALIZE FOR LOAD answer; get back
    /// the credit command for the card.
    fn begin_reload(&self, umtc: &str, purse_info: &str, init: &str) -> Result<String>;

    /// Report the card's answer to the credit command.
    fn complete_reload(&self, umtc: &str, response: &str) -> Result<bool>;
}

/// Bytes as base64 of their upper-case hex rendering.
pub fn encode_blob(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes_to_hex(bytes))
}

pub fn decode_blob(blob: &str) -> Result<Vec<u8>> {
    let ascii = BASE64_STANDARD
        .decode(blob.trim())
        .map_err(|e| Error::Reload(format!("bad base64 from service: {}", e)))?;
    ::hex::decode(&ascii).map_err(|e| Error::Reload(format!("bad hex from service: {}", e)))
}

/// INITIALIZE FOR LOAD, `90 40 00 00 04 amount`.
pub fn init_for_load(amount_cents: u32) -> [u8; 9] {
    let mut cmd = [0x90, 0x40, 0x00, 0x00, 0x04, 0, 0, 0, 0];
    cmd[5..].copy_from_slice(&amount_cents.to_be_bytes());
    cmd
}

/// Purse record as it reads after a successful CREDIT, built from the
/// exchange instead of another READ RECORD.
pub fn predict_purse(init_cmd: &[u8], init: &[u8], credit: &[u8], response: &[u8]) -> Option<Vec<u8>> {
    let bal = response.get(0..4)?;
    let nt = init.get(14..18)?;
    let amount = init_cmd.get(5..9)?;
    let sam = credit.get(5..17)?;

    let mut purse = Vec::with_capacity(PURSE_RECORD_LEN);
    purse.push(PURSE_RECORD_TYPE);
    purse.push(PURSE_RECORD_LEN as u8);
    purse.extend_from_slice(bal);
    purse.extend_from_slice(nt);
    purse.extend_from_slice(amount);
    purse.extend_from_slice(sam);
    Some(purse)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// The card's answer to the credit command.
    pub response: Vec<u8>,
    /// The card accepted the credit.
    pub credited: bool,
    /// The service acknowledged completion.
    pub confirmed: bool,
}

/// Run one reload of `amount_cents` on a selected Snapper purse.
///
/// On success the card's purse record is refreshed, predicted from the
/// exchange when the service returned a standard CREDIT command.
pub fn perform_reload(
    ch: &dyn CardChannel,
    card: &mut SnapperCard,
    service: &dyn ReloadService,
    umtc: &str,
    amount_cents: u32,
) -> Result<ReloadOutcome> {
    info!("reload {} of {} cents", umtc, amount_cents);
    let init_cmd = init_for_load(amount_cents);
    let init = ch.transmit(&init_cmd)?;

    let credit_blob = service.begin_reload(umtc, &encode_blob(card.purse_info()), &encode_blob(&init))?;
    let credit = decode_blob(&credit_blob)?;
    debug!("credit command {}", bytes_to_hex(&credit));

    let response = ch.transmit(&credit)?;
    let credited = response.len() > 2;
    if credited {
        let purse = if credit.starts_with(&CARD_CREDIT_HEADER) {
            predict_purse(&init_cmd, &init, &credit, &response)
        } else {
            None
        };
        let purse = match purse {
            Some(p) => p,
            None => retry::transmit_read(ch, &apdu::SNAPPER_READ_PURSE)?,
        };
        if purse.len() > 2 {
            card.set_purse(purse);
        }
    }

    let confirmed = service.complete_reload(umtc, &encode_blob(&response))?;
    Ok(ReloadOutcome {
        response,
        credited,
        confirmed,
    })
}

/// Apply every pending reload for `card`, which must still be the card in
/// the reader. Returns the total credited.
pub fn apply_pending(
    ch: &dyn CardChannel,
    card: &mut SnapperCard,
    service: &dyn ReloadService,
) -> Result<u64> {
    let purse_id = card
        .purse_id()
        .ok_or_else(|| Error::Reload("purse info too short".into()))?;

    let info = ch.transmit(&apdu::select(&apdu::SNAPPER_AID, false))?;
    if info != card.purse_info() {
        return Err(Error::Reload("a different card is in the reader".into()));
    }

    let mut total = 0u64;
    for pending in service.pending_reloads(&purse_id)? {
        let outcome = perform_reload(ch, card, service, &pending.umtc, pending.amount_cents)?;
        if outcome.credited {
            total += u64::from(pending.amount_cents);
        }
    }
    Ok(total)
}
