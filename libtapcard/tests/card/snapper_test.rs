#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libtapcard::card::{CardProfile, IdCenter, Scheme, SnapperCard, apdu, read_card};
use libtapcard::channel::ScriptedChannel;
use libtapcard::config::ReaderConfig;

fn config() -> ReaderConfig {
    ReaderConfig::builder().enable_emv(false).build()
}

#[test]
fn prepaid_purse_read_end_to_end() {
    common::init_logger();
    let ch = ScriptedChannel::contactless()
        .expect(&apdu::select(&apdu::SNAPPER_AID, false), &fixtures::snapper_purse_info())
        .expect(&apdu::SNAPPER_READ_PURSE, &fixtures::snapper_purse(2_550));

    let profile = read_card(&ch, &config(), |_| true).unwrap().unwrap();
    assert_eq!(profile.scheme(), Scheme::Snapper);
    assert_eq!(profile.issuer_name(), "Snapper");
    assert_eq!(profile.pan(), "1010000000346072");
    assert_eq!(profile.expiry(), "15/02/2026");
    assert_eq!(profile.balance(), Some(2_550));
    assert_eq!(profile.balance_text().as_deref(), Some("$25.50"));

    let CardProfile::Snapper(card) = &profile else {
        panic!("not a snapper profile: {:?}", profile);
    };
    assert_eq!(card.id_center(), IdCenter::Snapper);
    assert_eq!(card.max_balance(), Some(100_000));
    assert_eq!(card.purse_id().as_deref(), Some("1010000000346072"));
    assert_eq!(ch.remaining(), 0);
}

#[test]
fn same_purse_info_is_same_card() {
    let a = CardProfile::Snapper(SnapperCard::new(fixtures::snapper_purse_info()));
    let b = CardProfile::Snapper(SnapperCard::new(fixtures::snapper_purse_info()));
    assert!(a.is_same_card(&b));

    let mut info = fixtures::snapper_purse_info();
    info[15] ^= 0x01;
    let c = CardProfile::Snapper(SnapperCard::new(info));
    assert!(!a.is_same_card(&c));
}

#[test]
fn postpaid_purse_has_no_balance() {
    let mut info = fixtures::snapper_purse_info();
    info[4] = 0x10;
    let ch = ScriptedChannel::contactless().respond(&info);
    let profile = read_card(&ch, &config(), |_| true).unwrap().unwrap();
    assert_eq!(profile.scheme(), Scheme::Snapper);
    assert_eq!(profile.balance(), None);
    assert_eq!(profile.balance_text(), None);
    assert_eq!(ch.sent().len(), 1);
}

#[test]
fn tmoney_center() {
    let mut info = fixtures::snapper_purse_info();
    info[7] = 0x09;
    let card = SnapperCard::new(info);
    assert_eq!(card.id_center(), IdCenter::TMoney);
    assert_eq!(card.issuer_name(), "T-money");
}

#[test]
fn balance_display_by_id_center() {
    let read = |center: u8| {
        let mut info = fixtures::snapper_purse_info();
        info[7] = center;
        let ch = ScriptedChannel::contactless()
            .respond(&info)
            .respond(&fixtures::snapper_purse(5_000));
        let profile = read_card(&ch, &config(), |_| true).unwrap().unwrap();
        assert_eq!(profile.balance(), Some(5_000));
        profile.balance_text()
    };
    assert_eq!(read(0), None);
    assert_eq!(read(1).as_deref(), Some("$50.00"));
    assert_eq!(read(2).as_deref(), Some("$50.00"));
    assert_eq!(read(9).as_deref(), Some("\u{20A9}5000"));
}
