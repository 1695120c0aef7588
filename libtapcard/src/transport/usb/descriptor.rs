// tapcard-rs/libtapcard/src/transport/usb/descriptor.rs

use rusb::{Device, Direction, TransferType, UsbContext};

/// Bulk endpoints of the reader's host interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub bulk_in: u8,
    pub bulk_out: u8,
    pub interface: u8,
}

/// Inspect the active configuration and return the first interface that
/// carries both a bulk IN and a bulk OUT endpoint.
pub fn find_bulk_endpoints<C: UsbContext>(device: &Device<C>) -> Option<Endpoints> {
    let config = device.active_config_descriptor().ok()?;
    for interface in config.interfaces() {
        for desc in interface.descriptors() {
            let mut bulk_in = None;
            let mut bulk_out = None;
            for ep in desc.endpoint_descriptors() {
                if ep.transfer_type() != TransferType::Bulk {
                    continue;
                }
                match ep.direction() {
                    Direction::In if bulk_in.is_none() => bulk_in = Some(ep.address()),
                    Direction::Out if bulk_out.is_none() => bulk_out = Some(ep.address()),
                    _ => {}
                }
            }
            if let (Some(bulk_in), Some(bulk_out)) = (bulk_in, bulk_out) {
                return Some(Endpoints {
                    bulk_in,
                    bulk_out,
                    interface: desc.interface_number(),
                });
            }
        }
    }
    None
}
