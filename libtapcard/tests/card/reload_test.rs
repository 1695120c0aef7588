#[path = "../common/mod.rs"]
mod common;

use parking_lot::Mutex;

use common::fixtures;
use libtapcard::card::{SnapperCard, apdu};
use libtapcard::channel::ScriptedChannel;
use libtapcard::reload::{
    PendingReload, ReloadService, apply_pending, decode_blob, encode_blob, init_for_load,
    perform_reload,
};
use libtapcard::{Error, Result};

#[derive(Default)]
struct FakeService {
    credit: Vec<u8>,
    pending: Vec<PendingReload>,
    begun: Mutex<Vec<(String, Vec<u8>, Vec<u8>)>>,
    completed: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ReloadService for FakeService {
    fn pending_reloads(&self, _purse_id: &str) -> Result<Vec<PendingReload>> {
        Ok(self.pending.clone())
    }

    fn begin_reload(&self, umtc: &str, purse_info: &str, init: &str) -> Result<String> {
        self.begun
            .lock()
            .push((umtc.to_string(), decode_blob(purse_info)?, decode_blob(init)?));
        Ok(encode_blob(&self.credit))
    }

    fn complete_reload(&self, umtc: &str, response: &str) -> Result<bool> {
        self.completed
            .lock()
            .push((umtc.to_string(), decode_blob(response)?));
        Ok(true)
    }
}

fn init_answer() -> Vec<u8> {
    common::hex("100000000001101000000034607200000003F04130754BF661A0E886AA2A9000")
}

#[test]
fn service_sees_card_bytes_unchanged() {
    common::init_logger();
    let info = fixtures::snapper_purse_info();
    let credit = common::hex("9042000010101000003000031700003278404A3D16");
    let ch = ScriptedChannel::contactless()
        .expect(&init_for_load(500), &init_answer())
        .expect(&credit, &common::hex("000001F426FC1BC19000"));
    let service = FakeService {
        credit: credit.clone(),
        ..Default::default()
    };
    let mut card = SnapperCard::new(info.clone());

    let outcome = perform_reload(&ch, &mut card, &service, "t-7", 500).unwrap();
    assert!(outcome.credited);
    assert!(outcome.confirmed);
    assert_eq!(card.balance(), Some(500));

    let begun = service.begun.lock();
    assert_eq!(begun[0].0, "t-7");
    assert_eq!(begun[0].1, info);
    assert_eq!(begun[0].2, init_answer());
    assert_eq!(service.completed.lock()[0].1, outcome.response);
}

#[test]
fn unknown_credit_format_rereads_purse() {
    let credit = common::hex("9044000004DEADBEEF");
    let ch = ScriptedChannel::contactless()
        .respond(&init_answer())
        .expect(&credit, &common::hex("01029000"))
        .expect(&apdu::SNAPPER_READ_PURSE, &fixtures::snapper_purse(7_000));
    let service = FakeService {
        credit,
        ..Default::default()
    };
    let mut card = SnapperCard::new(fixtures::snapper_purse_info());
    perform_reload(&ch, &mut card, &service, "t-8", 1_000).unwrap();
    assert_eq!(card.balance(), Some(7_000));
    assert_eq!(ch.remaining(), 0);
}

#[test]
fn refused_credit_is_still_reported() {
    let credit = common::hex("9042000010101000003000031700003278404A3D16");
    let ch = ScriptedChannel::contactless()
        .respond(&init_answer())
        .respond(&[0x69, 0x85]);
    let service = FakeService {
        credit,
        ..Default::default()
    };
    let mut card = SnapperCard::new(fixtures::snapper_purse_info());
    let outcome = perform_reload(&ch, &mut card, &service, "t-9", 1_000).unwrap();
    assert!(!outcome.credited);
    assert_eq!(card.balance(), None);
    assert_eq!(service.completed.lock()[0].1, vec![0x69, 0x85]);
}

#[test]
fn nothing_pending_credits_nothing() {
    let info = fixtures::snapper_purse_info();
    let ch = ScriptedChannel::contactless().expect(&apdu::select(&apdu::SNAPPER_AID, false), &info);
    let service = FakeService::default();
    let mut card = SnapperCard::new(info);
    assert_eq!(apply_pending(&ch, &mut card, &service).unwrap(), 0);
}

#[test]
fn garbage_blob_is_reload_error() {
    assert!(matches!(decode_blob("not base64!"), Err(Error::Reload(_))));
}
