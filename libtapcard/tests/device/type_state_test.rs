#[path = "../common/mod.rs"]
mod common;

use libtapcard::config::ReaderConfig;
use libtapcard::device::{Device, DeviceBuilder};
use libtapcard::test_support::script_init;
use libtapcard::transport::MockTransport;
use libtapcard::Error;

#[test]
fn initialize_transitions_and_reports_firmware() {
    common::init_logger();
    let mock = MockTransport::new();
    script_init(&mock).unwrap();

    let device = Device::new_with_transport(Box::new(mock.clone()));
    let initialized = device.initialize().unwrap();
    let fw = initialized.firmware().unwrap();
    assert_eq!(fw.ic, 0x33);
    assert_eq!(mock.resets(), 1);
    assert!(initialized.sequencer().is_idle());
}

#[test]
fn builder_carries_config() {
    let mock = MockTransport::new();
    script_init(&mock).unwrap();
    let config = ReaderConfig::builder()
        .receive_timeout_ms(50)
        .max_select_retries(2)
        .build();
    let device = DeviceBuilder::new()
        .with_transport(Box::new(mock))
        .with_config(config.clone())
        .build_uninitialized()
        .unwrap()
        .initialize()
        .unwrap();
    assert_eq!(device.config(), &config);
}

#[test]
fn builder_without_transport_has_no_device() {
    assert!(matches!(
        DeviceBuilder::new().build_uninitialized(),
        Err(Error::DeviceNotFound)
    ));
}

#[test]
fn silent_chip_times_out_initialization() {
    let mock = MockTransport::new();
    let device = Device::new_with_transport(Box::new(mock.clone()));
    assert!(matches!(device.initialize(), Err(Error::Timeout)));
    // The firmware request, then the aborting ACK
    let sent = mock.sent();
    assert_eq!(sent.last().unwrap(), &libtapcard::constants::ACK_FRAME.to_vec());
}
