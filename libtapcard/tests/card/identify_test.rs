#[path = "../common/mod.rs"]
mod common;

use std::cell::Cell;

use libtapcard::card::{CardProfile, IdentifyState, Identifier, Scheme, apdu, read_card};
use libtapcard::channel::{CardChannel, ReaderKind, ScriptedChannel};
use libtapcard::config::ReaderConfig;
use libtapcard::{Error, Result};

use common::fixtures;

const NOT_FOUND: [u8; 2] = [0x6A, 0x82];

/// Channel whose link to the reader is corrupt.
struct BrokenLink;

impl CardChannel for BrokenLink {
    fn transmit(&self, _apdu: &[u8]) -> Result<Vec<u8>> {
        Err(Error::ChecksumMismatch {
            expected: 0x00,
            actual: 0x01,
        })
    }

    fn begin_transaction(&self) -> Result<bool> {
        Ok(true)
    }

    fn end_transaction(&self, _keep: bool) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> ReaderKind {
        ReaderKind::Contactless
    }
}

#[test]
fn framing_error_is_not_swallowed() {
    let config = ReaderConfig::default();
    let err = Identifier::new(&BrokenLink, &config).identify().unwrap_err();
    assert!(err.is_framing());
    assert!(read_card(&BrokenLink, &config, |_| true).is_err());
}

#[test]
fn emv_read_that_never_completes_falls_through() {
    // PPSE lists an application whose select fails
    let ch = ScriptedChannel::contactless()
        .respond(&fixtures::ppse(&[(&fixtures::VISA_AID, "VISA")]))
        .respond(&NOT_FOUND)
        .expect(&apdu::select(&apdu::SNAPPER_AID, false), &fixtures::snapper_purse_info())
        .respond(&fixtures::snapper_purse(100));
    let config = ReaderConfig::default();
    let mut id = Identifier::new(&ch, &config);
    let profile = id.identify().unwrap();
    assert_eq!(profile.scheme(), Scheme::Snapper);
    assert_eq!(id.state(), IdentifyState::Identified(Scheme::Snapper));
}

#[test]
fn keep_decides_only_for_identified_cards() {
    let config = ReaderConfig::default();
    let asked = Cell::new(0);

    let ch = ScriptedChannel::contactless()
        .respond(&NOT_FOUND)
        .respond(&NOT_FOUND)
        .respond(&NOT_FOUND);
    let profile = read_card(&ch, &config, |_| {
        asked.set(asked.get() + 1);
        true
    })
    .unwrap()
    .unwrap();
    assert!(matches!(profile, CardProfile::Unknown));
    assert_eq!(asked.get(), 0);

    let ch = ScriptedChannel::contactless()
        .respond(&NOT_FOUND)
        .respond(&fixtures::snapper_purse_info())
        .respond(&fixtures::snapper_purse(0));
    read_card(&ch, &config, |p| {
        asked.set(asked.get() + 1);
        p.scheme() == Scheme::Snapper
    })
    .unwrap()
    .unwrap();
    assert_eq!(asked.get(), 1);
}

#[test]
fn transaction_is_released_between_reads() {
    let config = ReaderConfig::default();
    let ch = ScriptedChannel::new(ReaderKind::Contact);
    // No script: the first transmit reports the card gone
    for _ in 0..2 {
        let profile = read_card(&ch, &config, |_| true).unwrap().unwrap();
        assert!(matches!(profile, CardProfile::Unknown));
    }
    assert_eq!(ch.transactions(), 2);
}
