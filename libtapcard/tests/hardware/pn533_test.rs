#![cfg(feature = "usb")]

//! Tests against a real PN533 reader. Run manually with:
//!
//! cargo test -p libtapcard --test hardware --features usb -- --ignored

use std::sync::Arc;

use libtapcard::card::read_card;
use libtapcard::channel::NfcChannel;
use libtapcard::config::ReaderConfig;
use libtapcard::device::{Device, Initialized};
use libtapcard::transport::UsbTransport;
use libtapcard::{Error, Result};

/// Open and initialise the first reader; `Ok(None)` when none is attached.
fn open_reader() -> Result<Option<Device<Initialized>>> {
    match UsbTransport::open() {
        Ok(transport) => {
            let device = Device::new_with_transport(Box::new(transport)).initialize()?;
            Ok(Some(device))
        }
        Err(Error::DeviceNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

#[test]
#[ignore]
fn open_and_initialize() -> Result<()> {
    if let Some(device) = open_reader()? {
        assert!(device.firmware().is_some());
    }
    Ok(())
}

#[test]
#[ignore]
fn read_card_on_reader() -> Result<()> {
    let Some(device) = open_reader()? else {
        return Ok(());
    };
    device.prepare_field()?;
    let ch = NfcChannel::new(Arc::new(device));
    let config = ReaderConfig::default();
    if let Some(profile) = read_card(&ch, &config, |_| false)? {
        println!("{}: {} {}", profile.scheme(), profile.pan(), profile.expiry());
    }
    Ok(())
}
