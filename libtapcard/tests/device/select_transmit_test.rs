#[path = "../common/mod.rs"]
mod common;

use libtapcard::config::ReaderConfig;
use libtapcard::constants::ACK_FRAME;
use libtapcard::device::Device;
use libtapcard::protocol::RfOption;
use libtapcard::test_support::{
    initialized_mock_device, script_card_response, script_init, script_select, select_response,
};
use libtapcard::transport::MockTransport;
use libtapcard::Error;

const NO_TARGET: [u8; 3] = [0xD5, 0x4B, 0x00];

#[test]
fn select_retries_until_target_appears() {
    let (dev, mock) = initialized_mock_device().unwrap();
    script_select(&mock, &NO_TARGET).unwrap();
    script_select(&mock, &select_response(&[0xDE, 0xAD, 0xBE, 0xEF], true)).unwrap();

    let session = dev.select().unwrap();
    assert_eq!(session.uid(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    assert!(session.has_tb());

    let selects = mock
        .sent_payloads()
        .into_iter()
        .filter(|p| p[..2] == [0xD4, 0x4A])
        .count();
    assert_eq!(selects, 2);
}

#[test]
fn select_gives_up_after_configured_attempts() {
    let mock = MockTransport::new();
    script_init(&mock).unwrap();
    let config = ReaderConfig::builder().max_select_retries(2).build();
    let dev = Device::with_config(Box::new(mock.clone()), config)
        .initialize()
        .unwrap();
    script_select(&mock, &NO_TARGET).unwrap();
    script_select(&mock, &NO_TARGET).unwrap();
    script_select(&mock, &select_response(&[1, 2, 3, 4], false)).unwrap();

    assert!(matches!(dev.select(), Err(Error::NoCard)));
    // The third answer was never asked for
    assert_eq!(mock.pending_responses(), 1);
}

#[test]
fn transmit_picks_exchange_by_tb() {
    let (dev, mock) = initialized_mock_device().unwrap();

    script_select(&mock, &select_response(&[1, 2, 3, 4], false)).unwrap();
    let session = dev.select().unwrap();
    script_card_response(&mock, false, &[0x90, 0x00]).unwrap();
    assert_eq!(dev.transmit(&session, &[0x00, 0xC0, 0x00, 0x00, 0x00]).unwrap(), vec![0x90, 0x00]);
    assert_eq!(
        mock.sent_payloads().pop().unwrap(),
        vec![0xD4, 0x42, 0x02, 0x00, 0xC0, 0x00, 0x00, 0x00]
    );

    script_select(&mock, &select_response(&[5, 6, 7, 8], true)).unwrap();
    let session = dev.select().unwrap();
    script_card_response(&mock, true, &[0x6A, 0x82]).unwrap();
    assert_eq!(dev.transmit(&session, &[0x00, 0xB2, 0x01, 0x0C, 0x00]).unwrap(), vec![0x6A, 0x82]);
    assert_eq!(mock.sent_payloads().pop().unwrap()[..3], [0xD4, 0x40, 0x01]);
}

#[test]
fn transmit_timeout_aborts_and_leaves_sequencer_idle() {
    let (dev, mock) = initialized_mock_device().unwrap();
    script_select(&mock, &select_response(&[1, 2, 3, 4], true)).unwrap();
    let session = dev.select().unwrap();

    assert!(matches!(dev.transmit(&session, &[0x00]), Err(Error::Timeout)));
    assert_eq!(mock.sent().last().unwrap(), &ACK_FRAME.to_vec());
    assert!(dev.sequencer().is_idle());
}

#[test]
fn failed_write_does_not_block_later_commands() {
    let (dev, mock) = initialized_mock_device().unwrap();
    script_select(&mock, &select_response(&[1, 2, 3, 4], true)).unwrap();
    let session = dev.select().unwrap();

    mock.fail_sends(1);
    assert!(matches!(dev.transmit(&session, &[0x00, 0xB0]), Err(Error::DeviceNotFound)));
    assert!(dev.sequencer().is_idle());

    // Answered straight away, not after a receive timeout
    script_card_response(&mock, true, &[0x90, 0x00]).unwrap();
    assert_eq!(dev.transmit(&session, &[0x00, 0xB0]).unwrap(), vec![0x90, 0x00]);
    assert_eq!(mock.pending_responses(), 0);
}

#[test]
fn prepare_field_sends_three_rf_configurations() {
    let (dev, mock) = initialized_mock_device().unwrap();
    for _ in 0..3 {
        mock.push_ack_and_frame(&[0xD5, 0x33]).unwrap();
    }
    dev.prepare_field().unwrap();
    let rf: Vec<_> = mock
        .sent_payloads()
        .into_iter()
        .filter(|p| p[..2] == [0xD4, 0x32])
        .collect();
    assert_eq!(rf, vec![
        vec![0xD4, 0x32, 0x01, 0x00],
        vec![0xD4, 0x32, 0x05, 0xFF, 0xFF, 0xFF],
        vec![0xD4, 0x32, 0x01, 0x01],
    ]);

    mock.push_ack_and_frame(&[0xD5, 0x33]).unwrap();
    dev.configure(RfOption::InfiniteSelect, false).unwrap();
}
