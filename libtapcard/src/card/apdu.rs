// tapcard-rs/libtapcard/src/card/apdu.rs

//! Fixed command APDUs and builders for the ones that carry data.

pub const PPSE_NAME: &[u8] = b"2PAY.SYS.DDF01";
pub const PSE_NAME: &[u8] = b"1PAY.SYS.DDF01";
pub const SNAPPER_AID: [u8; 7] = [0xD4, 0x10, 0x00, 0x00, 0x03, 0x00, 0x01];
pub const CALYPSO_AID: &[u8] = b"1TIC.ICA";

pub const GET_RESPONSE: [u8; 5] = [0x00, 0xC0, 0x00, 0x00, 0x00];
pub const SNAPPER_READ_PURSE: [u8; 5] = [0x00, 0xB2, 0x01, 0x24, 0x1A];
pub const CALYPSO_READ_ENVIRONMENT: [u8; 5] = [0x94, 0xB2, 0x01, 0x38, 0x19];
pub const CALYPSO_SV_GET_LOAD: [u8; 5] = [0x00, 0x7C, 0x00, 0x07, 0x21];
pub const CALYPSO_SV_GET_LOAD_ALT: [u8; 5] = [0xFA, 0x7C, 0x00, 0x07, 0x21];

/// SELECT by name, `00 A4 04 00 Lc name [00]`.
///
/// Names are at most 16 bytes (ISO 7816-4), so `Lc` always fits.
pub fn select(name: &[u8], with_le: bool) -> Vec<u8> {
    let mut apdu = Vec::with_capacity(6 + name.len());
    apdu.extend_from_slice(&[0x00, 0xA4, 0x04, 0x00, name.len() as u8]);
    apdu.extend_from_slice(name);
    if with_le {
        apdu.push(0x00);
    }
    apdu
}

/// READ RECORD `record` of the file in `sfi`, `00 B2 rec (sfi << 3)|4 00`.
pub fn read_record(record: u8, sfi: u8) -> [u8; 5] {
    [0x00, 0xB2, record, (sfi << 3) | 0x04, 0x00]
}

/// GET RESPONSE asking for `le` bytes.
pub fn get_response(le: u8) -> [u8; 5] {
    let mut apdu = GET_RESPONSE;
    apdu[4] = le;
    apdu
}
