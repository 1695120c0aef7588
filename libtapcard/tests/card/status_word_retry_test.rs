#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{self, VISA_AID};
use libtapcard::StatusWord;
use libtapcard::card::{apdu, retry};
use libtapcard::channel::{CardChannel, ScriptedChannel};

#[test]
fn contact_ppse_wrong_length_reissued_with_le() {
    let select = apdu::select(apdu::PPSE_NAME, false);
    let mut reissue = select.clone();
    reissue.push(0x1C);
    let fci = fixtures::ppse(&[(&VISA_AID, "VISA")]);

    let ch = ScriptedChannel::contact()
        .expect(&select, &[0x6C, 0x1C])
        .expect(&reissue, &fci);
    let resp = ch.transmit(&select).unwrap();
    let resp = retry::handle_67_6c(&ch, &select, resp).unwrap();
    assert_eq!(resp, fci);
    assert_eq!(ch.sent().len(), 2);
}

#[test]
fn case4_reissue_drops_stale_le() {
    // Contactless select already carries Le 00; the reissue replaces it
    let select = apdu::select(&VISA_AID, true);
    let mut reissue = apdu::select(&VISA_AID, false);
    reissue.push(0x40);
    let ch = ScriptedChannel::contactless().expect(&reissue, &[0x90, 0x00]);
    let resp = retry::handle_67_6c(&ch, &select, vec![0x67, 0x40]).unwrap();
    assert_eq!(resp, vec![0x90, 0x00]);
}

#[test]
fn second_wrong_length_is_returned_not_retried() {
    let ch = ScriptedChannel::contact()
        .respond(&[0x6C, 0x10])
        .respond(&[0x6C, 0x08]);
    let resp = retry::transmit_read(&ch, &apdu::read_record(1, 1)).unwrap();
    assert_eq!(StatusWord::from_response(&resp).unwrap().wrong_length(), Some(0x08));
    assert_eq!(ch.sent(), vec![
        apdu::read_record(1, 1).to_vec(),
        vec![0x00, 0xB2, 0x01, 0x0C, 0x10],
    ]);
    assert_eq!(ch.remaining(), 0);
}

#[test]
fn data_with_6c_trailer_is_not_a_retry() {
    let ch = ScriptedChannel::contact();
    let resp = retry::handle_67_6c(&ch, &apdu::select(&VISA_AID, false), vec![0x01, 0x6C, 0x10])
        .unwrap();
    assert_eq!(resp, vec![0x01, 0x6C, 0x10]);
    assert!(ch.sent().is_empty());
}
