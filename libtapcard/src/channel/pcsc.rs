// tapcard-rs/libtapcard/src/channel/pcsc.rs

use std::ffi::{CStr, CString};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;
use pcsc::{Card, Context, Disposition, MAX_BUFFER_SIZE, Protocols, Scope, ShareMode};

use crate::card::apdu::get_response;
use crate::channel::gate::TransactionGate;
use crate::channel::{CardChannel, ReaderKind, should_disconnect};
use crate::types::StatusWord;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// Card channel over a native PC/SC reader.
pub struct PcscChannel {
    context: Context,
    reader: CString,
    kind: ReaderKind,
    card: Mutex<Option<Card>>,
    gate: TransactionGate,
    t0: AtomicBool,
    must_dispose: AtomicBool,
}

impl PcscChannel {
    pub fn new(context: Context, reader: &CStr, kind: ReaderKind) -> Self {
        Self {
            context,
            reader: reader.to_owned(),
            kind,
            card: Mutex::new(None),
            gate: TransactionGate::new(),
            t0: AtomicBool::new(false),
            must_dispose: AtomicBool::new(false),
        }
    }

    /// Channel on the first reader the PC/SC service lists.
    pub fn first_reader(kind: ReaderKind) -> Result<Self> {
        let context = Context::establish(Scope::User)?;
        let mut buf = [0u8; 2048];
        let reader = context
            .list_readers(&mut buf)?
            .next()
            .map(CStr::to_owned)
            .ok_or(Error::DeviceNotFound)?;
        debug!("using reader {:?}", reader);
        Ok(Self::new(context, &reader, kind))
    }

    pub fn reader_name(&self) -> &CStr {
        &self.reader
    }

    /// The card was pulled. The connection is dropped now, or at the end
    /// of the running transaction.
    pub fn card_removed(&self) {
        if self.gate.is_held() {
            self.must_dispose.store(true, Ordering::SeqCst);
        } else {
            disconnect(self.card.lock().take());
        }
    }

    fn send(card: &Card, apdu: &[u8]) -> Result<Vec<u8>> {
        let mut buf = [0u8; MAX_BUFFER_SIZE];
        trace!(">> {}", bytes_to_hex(apdu));
        let resp = card.transmit(apdu, &mut buf)?.to_vec();
        trace!("<< {}", bytes_to_hex(&resp));
        Ok(resp)
    }
}

fn disconnect(card: Option<Card>) {
    if let Some(card) = card {
        if let Err((_, e)) = card.disconnect(Disposition::ResetCard) {
            debug!("disconnect failed: {}", e);
        }
    }
}

impl CardChannel for PcscChannel {
    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>> {
        let mut guard = self.card.lock();
        let card = guard.as_ref().ok_or(Error::NoCard)?;

        let result = Self::send(card, apdu).and_then(|resp| {
            match StatusWord::from_response(&resp).and_then(|sw| sw.more_data()) {
                Some(le) if resp.len() == 2 => {
                    // T=0 style card in a contact slot, or a SIM
                    self.t0.store(true, Ordering::Relaxed);
                    Self::send(card, &get_response(le))
                }
                _ => Ok(resp),
            }
        });

        if result.is_err() {
            debug!("transmit failed, dropping connection");
            disconnect(guard.take());
        }
        result
    }

    fn begin_transaction(&self) -> Result<bool> {
        self.gate.acquire();
        let mut card = self.card.lock();
        if card.is_some() {
            return Ok(true);
        }
        match self
            .context
            .connect(&self.reader, ShareMode::Shared, Protocols::ANY)
        {
            Ok(c) => {
                *card = Some(c);
                Ok(true)
            }
            Err(e) => {
                debug!("connect to card failed: {}", e);
                drop(card);
                self.gate.release();
                match e {
                    pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard => Ok(false),
                    other => Err(other.into()),
                }
            }
        }
    }

    fn end_transaction(&self, keep: bool) -> Result<()> {
        let must_dispose = self.must_dispose.swap(false, Ordering::SeqCst);
        if should_disconnect(self.kind, keep, must_dispose) {
            debug!("closing connection to {:?}", self.reader);
            disconnect(self.card.lock().take());
        }
        self.gate.release();
        Ok(())
    }

    fn kind(&self) -> ReaderKind {
        self.kind
    }

    fn supports_t0(&self) -> bool {
        self.t0.load(Ordering::Relaxed)
    }
}
