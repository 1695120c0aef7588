// tapcard-rs/libtapcard/src/transport/usb/mod.rs

use log::{debug, trace};
use rusb::{Context, DeviceHandle, UsbContext};

use crate::constants::{NXP_PN533_PRODUCT_ID, NXP_VENDOR_ID};
use crate::transport::traits::Transport;
use crate::utils::{bytes_to_hex_spaced, ms};
use crate::{Error, Result};

mod descriptor;
use descriptor::{Endpoints, find_bulk_endpoints};

/// Bulk-endpoint transport to a PN533 based reader (NXP 04CC:0531).
pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    endpoints: Endpoints,
    write_timeout_ms: u64,
}

impl UsbTransport {
    /// Open the first PN533 reader found on the bus.
    pub fn open() -> Result<Self> {
        Self::open_matching(NXP_VENDOR_ID, NXP_PN533_PRODUCT_ID)
    }

    /// Open the first device with the given vendor/product id.
    pub fn open_matching(vendor_id: u16, product_id: u16) -> Result<Self> {
        let ctx = Context::new()?;
        for device in ctx.devices()?.iter() {
            let dd = device.device_descriptor()?;
            if dd.vendor_id() != vendor_id || dd.product_id() != product_id {
                continue;
            }
            let Some(endpoints) = find_bulk_endpoints(&device) else {
                debug!("reader at bus {} has no bulk pair", device.bus_number());
                continue;
            };

            let mut handle = device.open()?;
            // Linux may bind a kernel driver to the reader; detaching is
            // best-effort and claim_interface reports the real failure.
            if let Ok(true) = handle.kernel_driver_active(endpoints.interface) {
                let _ = handle.detach_kernel_driver(endpoints.interface);
            }
            handle.claim_interface(endpoints.interface)?;
            debug!(
                "opened {:04x}:{:04x} in={:#04x} out={:#04x}",
                vendor_id, product_id, endpoints.bulk_in, endpoints.bulk_out
            );

            return Ok(UsbTransport {
                handle,
                endpoints,
                write_timeout_ms: crate::utils::DEFAULT_READ_TIMEOUT_MS,
            });
        }

        Err(Error::DeviceNotFound)
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!("usb tx {}", bytes_to_hex_spaced(data));
        let timeout = ms(self.write_timeout_ms);
        self.handle
            .write_bulk(self.endpoints.bulk_out, data, timeout)
            .map_err(map_usb_err)?;
        Ok(())
    }

    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>> {
        let timeout = ms(timeout_ms);
        let mut buf = vec![0u8; 512];
        let n = self
            .handle
            .read_bulk(self.endpoints.bulk_in, &mut buf, timeout)
            .map_err(map_usb_err)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn reset(&mut self) -> Result<()> {
        let _ = self.handle.clear_halt(self.endpoints.bulk_in);
        let _ = self.handle.clear_halt(self.endpoints.bulk_out);
        Ok(())
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(self.endpoints.interface);
    }
}

fn map_usb_err(e: rusb::Error) -> Error {
    match e {
        rusb::Error::Timeout => Error::Timeout,
        rusb::Error::NoDevice => Error::DeviceNotFound,
        other => Error::Usb(other),
    }
}
