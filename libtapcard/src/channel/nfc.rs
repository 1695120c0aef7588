// tapcard-rs/libtapcard/src/channel/nfc.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::channel::gate::TransactionGate;
use crate::channel::{CardChannel, ReaderKind, should_disconnect};
use crate::device::{CardSession, Device, Initialized};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// Card channel backed by the PN533 command sequencer.
///
/// One APDU may be outstanding at a time; a second concurrent `transmit`
/// fails with `Busy`.
pub struct NfcChannel {
    device: Arc<Device<Initialized>>,
    session: Mutex<Option<CardSession>>,
    gate: TransactionGate,
    in_flight: AtomicBool,
    must_dispose: AtomicBool,
}

impl NfcChannel {
    pub fn new(device: Arc<Device<Initialized>>) -> Self {
        Self {
            device,
            session: Mutex::new(None),
            gate: TransactionGate::new(),
            in_flight: AtomicBool::new(false),
            must_dispose: AtomicBool::new(false),
        }
    }

    /// Channel over a target that is already selected.
    pub fn with_session(device: Arc<Device<Initialized>>, session: CardSession) -> Self {
        let ch = Self::new(device);
        *ch.session.lock() = Some(session);
        ch
    }

    pub fn session(&self) -> Option<CardSession> {
        self.session.lock().clone()
    }

    /// The card left the field. The connection is dropped now, or at the end
    /// of the running transaction.
    pub fn card_removed(&self) {
        if self.gate.is_held() {
            self.must_dispose.store(true, Ordering::SeqCst);
        } else {
            self.session.lock().take();
        }
    }
}

impl CardChannel for NfcChannel {
    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>> {
        let session = self.session.lock().clone().ok_or(Error::NoCard)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy);
        }

        trace!(">> {}", bytes_to_hex(apdu));
        let result = self.device.transmit(&session, apdu);
        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(resp) => {
                trace!("<< {}", bytes_to_hex(&resp));
                Ok(resp)
            }
            Err(e) => {
                debug!("transmit failed, dropping session: {}", e);
                self.session.lock().take();
                match e {
                    Error::Timeout => Err(Error::TransactionLost),
                    other => Err(other),
                }
            }
        }
    }

    fn begin_transaction(&self) -> Result<bool> {
        self.gate.acquire();
        if self.session.lock().is_some() {
            return Ok(true);
        }
        match self.device.select() {
            Ok(session) => {
                *self.session.lock() = Some(session);
                Ok(true)
            }
            Err(e) => {
                debug!("no target to connect: {}", e);
                self.gate.release();
                if e.is_framing() {
                    return Err(e);
                }
                Ok(false)
            }
        }
    }

    fn end_transaction(&self, keep: bool) -> Result<()> {
        let must_dispose = self.must_dispose.swap(false, Ordering::SeqCst);
        if should_disconnect(self.kind(), keep, must_dispose) {
            debug!("closing target session");
            self.session.lock().take();
        }
        self.gate.release();
        Ok(())
    }

    fn kind(&self) -> ReaderKind {
        ReaderKind::Contactless
    }
}
