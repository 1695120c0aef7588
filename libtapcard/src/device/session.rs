// tapcard-rs/libtapcard/src/device/session.rs

use crate::protocol::parser::{byte_at, slice_at};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// A target selected by InListPassiveTarget.
///
/// Response layout: `D5 4B NbTg Tg SENS_RES(2) SEL_RES NFCIDLen NFCID ATS`,
/// where the ATS starts with its own length byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSession {
    uid: Vec<u8>,
    ats: Vec<u8>,
    has_tb: bool,
}

impl CardSession {
    /// Parse the full select response payload.
    pub fn parse(resp: &[u8]) -> Result<Self> {
        let uid_len = byte_at(resp, 7)? as usize;
        let uid = slice_at(resp, 8, uid_len)?.to_vec();

        let ats_at = 8 + uid_len;
        let ats_len = resp.get(ats_at).copied().ok_or_else(|| {
            Error::UnsupportedOperation(format!(
                "target {} has no ATS (not ISO-DEP)",
                bytes_to_hex(&uid)
            ))
        })? as usize;
        // The length byte counts itself.
        let ats = slice_at(resp, ats_at + 1, ats_len.saturating_sub(1))?.to_vec();
        let has_tb = ats.first().is_some_and(|t0| t0 & 0x20 != 0);

        Ok(Self { uid, ats, has_tb })
    }

    pub fn uid(&self) -> &[u8] {
        &self.uid
    }

    /// ATS bytes after its length byte (T0 first).
    pub fn ats(&self) -> &[u8] {
        &self.ats
    }

    /// TB(1) present in the ATS: exchanges go through InDataExchange,
    /// otherwise through InCommunicateThru.
    pub fn has_tb(&self) -> bool {
        self.has_tb
    }
}
