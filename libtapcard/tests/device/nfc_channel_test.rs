#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::fixtures;
use libtapcard::card::{Scheme, apdu, read_card};
use libtapcard::channel::{CardChannel, NfcChannel};
use libtapcard::config::ReaderConfig;
use libtapcard::test_support::{
    initialized_mock_device, script_card_response, script_select, select_response,
};

#[test]
fn snapper_read_through_the_reader_chip() {
    common::init_logger();
    let (dev, mock) = initialized_mock_device().unwrap();
    let ch = NfcChannel::new(Arc::new(dev));

    script_select(&mock, &select_response(&[0x04, 0x11, 0x22, 0x33], false)).unwrap();
    script_card_response(&mock, false, &fixtures::snapper_purse_info()).unwrap();
    script_card_response(&mock, false, &fixtures::snapper_purse(12_345)).unwrap();

    let config = ReaderConfig::builder().enable_emv(false).build();
    let profile = read_card(&ch, &config, |_| true).unwrap().unwrap();
    assert_eq!(profile.scheme(), Scheme::Snapper);
    assert_eq!(profile.balance(), Some(12_345));
    assert_eq!(mock.pending_responses(), 0);

    // Each APDU went out wrapped in InCommunicateThru
    let sent = mock.sent_payloads();
    let n = sent.len();
    let mut select = vec![0xD4, 0x42, 0x02];
    select.extend(apdu::select(&apdu::SNAPPER_AID, false));
    assert_eq!(sent[n - 2], select);
    let mut read = vec![0xD4, 0x42, 0x02];
    read.extend_from_slice(&apdu::SNAPPER_READ_PURSE);
    assert_eq!(sent[n - 1], read);

    // Contactless sessions survive the end of a transaction
    assert!(ch.session().is_some());
}

#[test]
fn lost_card_mid_identification_yields_unknown() {
    let (dev, mock) = initialized_mock_device().unwrap();
    let ch = NfcChannel::new(Arc::new(dev));
    script_select(&mock, &select_response(&[1, 2, 3, 4], true)).unwrap();
    // No card answer scripted: the first APDU times out

    let config = ReaderConfig::default();
    let profile = read_card(&ch, &config, |_| true).unwrap().unwrap();
    assert_eq!(profile.scheme(), Scheme::Unknown);
    assert!(ch.session().is_none());
}

#[test]
fn no_target_means_no_card() {
    let (dev, _mock) = initialized_mock_device().unwrap();
    let ch = NfcChannel::new(Arc::new(dev));
    let config = ReaderConfig::default();
    assert!(read_card(&ch, &config, |_| true).unwrap().is_none());
    assert!(ch.is_contactless());
}

#[test]
fn truncated_ats_is_not_a_card() {
    let (dev, mock) = initialized_mock_device().unwrap();
    let ch = NfcChannel::new(Arc::new(dev));

    // The ATS length byte promises five bytes, two arrive
    let mut resp = select_response(&[1, 2, 3, 4], true);
    resp.truncate(resp.len() - 3);
    script_select(&mock, &resp).unwrap();

    assert!(!ch.begin_transaction().unwrap());
    assert!(ch.session().is_none());
    assert_eq!(mock.pending_responses(), 0);
}
