#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{self, MC_AID, PDOL, VISA_AID};
use libtapcard::card::apdu;
use libtapcard::card::{CardProfile, CardSummary, Scheme, read_card};
use libtapcard::channel::ScriptedChannel;
use libtapcard::config::{DEFAULT_COUNTRY_CODE, DEFAULT_TTQ, ReaderConfig};

#[test]
fn contactless_visa_read_stops_once_complete() {
    common::init_logger();
    let ch = ScriptedChannel::contactless()
        .expect(
            &apdu::select(apdu::PPSE_NAME, true),
            &fixtures::ppse(&[(&VISA_AID, "VISA"), (&MC_AID, "MASTERCARD")]),
        )
        .expect(
            &apdu::select(&VISA_AID, true),
            &fixtures::application_fci("VISA CREDIT", Some(&PDOL)),
        )
        // GPO carries a fresh unpredictable number, so it is not matched
        .respond(&fixtures::gpo_with_afl(&[0x08, 0x01, 0x01, 0x00]))
        .expect(&apdu::read_record(1, 1), &fixtures::track2_record());

    let config = ReaderConfig::default();
    let profile = read_card(&ch, &config, |_| true).unwrap().unwrap();

    assert_eq!(profile.scheme(), Scheme::Emv);
    assert_eq!(profile.pan(), "4111111111111111");
    assert_eq!(profile.expiry(), "12/25");
    assert_eq!(profile.issuer_name(), "VISA CREDIT");
    assert_eq!(profile.balance(), None);

    assert_eq!(ch.remaining(), 0);
    let sent = ch.sent();
    assert_eq!(sent.len(), 4);
    assert!(!sent.iter().any(|a| a == &apdu::select(&MC_AID, true)));
    assert_eq!(ch.transactions(), 1);
}

#[test]
fn gpo_carries_filled_pdol() {
    let ch = ScriptedChannel::contactless()
        .respond(&fixtures::ppse(&[(&VISA_AID, "VISA")]))
        .respond(&fixtures::application_fci("VISA", Some(&PDOL)))
        .respond(&fixtures::gpo_with_afl(&[0x08, 0x01, 0x01, 0x00]))
        .respond(&fixtures::track2_record());
    let config = ReaderConfig::default();
    read_card(&ch, &config, |_| false).unwrap().unwrap();

    let gpo = &ch.sent()[2];
    // 80 A8 00 00 Lc 83 L [TTQ amount UN currency country] Le
    assert_eq!(gpo[..4], [0x80, 0xA8, 0x00, 0x00]);
    assert_eq!(gpo[4] as usize, gpo.len() - 6);
    assert_eq!(gpo[5..7], [0x83, 18]);
    assert_eq!(gpo[7..11], DEFAULT_TTQ);
    assert_eq!(gpo[11..17], [0u8; 6]);
    assert_eq!(gpo[21..23], DEFAULT_COUNTRY_CODE);
    assert_eq!(gpo[23..25], DEFAULT_COUNTRY_CODE);
    assert_eq!(*gpo.last().unwrap(), 0x00);
}

#[test]
fn record_with_pan_and_expiry_tags() {
    let mut body = libtapcard::tlv::encode(0x5A, &[0x54, 0x13, 0x33, 0x00, 0x89, 0x02, 0x00, 0x11]);
    body.extend(libtapcard::tlv::encode(0x5F24, &[0x27, 0x03, 0x31]));
    let record = common::ok(libtapcard::tlv::encode(0x70, &body));

    let ch = ScriptedChannel::contactless()
        .respond(&fixtures::ppse(&[(&MC_AID, "MASTERCARD")]))
        .respond(&fixtures::application_fci("MASTERCARD", None))
        .respond(&fixtures::gpo_with_afl(&[0x10, 0x01, 0x02, 0x00]))
        .expect(&apdu::read_record(1, 2), &common::hex("6A83"))
        .expect(&apdu::read_record(2, 2), &record);
    let config = ReaderConfig::default();
    let profile = read_card(&ch, &config, |_| true).unwrap().unwrap();

    assert_eq!(profile.pan(), "5413330089020011");
    assert_eq!(profile.expiry(), "03/27");
    assert_eq!(ch.remaining(), 0);

    // No PDOL: an empty 83 template
    assert_eq!(ch.sent()[2], vec![0x80, 0xA8, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]);
}

#[test]
fn summary_of_emv_profile() {
    let ch = ScriptedChannel::contactless()
        .respond(&fixtures::ppse(&[(&VISA_AID, "VISA")]))
        .respond(&fixtures::application_fci("VISA", None))
        .respond(&fixtures::gpo_with_afl(&[0x08, 0x01, 0x01, 0x00]))
        .respond(&fixtures::track2_record());
    let config = ReaderConfig::default();
    let profile = read_card(&ch, &config, |_| true).unwrap().unwrap();
    let summary = CardSummary::from(&profile);
    assert_eq!(summary.scheme, Scheme::Emv);
    assert_eq!(summary.pan, "4111111111111111");

    // A second read of the same card is the same card
    let again = profile.clone();
    assert_eq!(profile, again);
    assert!(!matches!(profile, CardProfile::Unknown));
}
