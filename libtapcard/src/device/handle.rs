// tapcard-rs/libtapcard/src/device/handle.rs

use std::marker::PhantomData;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, info};

use crate::config::ReaderConfig;
use crate::device::config::INIT_REGISTERS;
use crate::device::session::CardSession;
use crate::protocol::{Command, RfOption};
use crate::sequencer::{MessageTask, SelectTask, Sequencer, SetRegisterTask, TransmitTask};
use crate::transport::Transport;
use crate::types::FirmwareVersion;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// Type-state markers
pub struct Uninitialized;
pub struct Initialized;

/// Reader-chip handle that enforces initialisation at compile time.
///
/// All exchanges go through one [`Sequencer`]; calls block, pumping the
/// transport until the submitted task reports back.
pub struct Device<State = Uninitialized> {
    sequencer: Arc<Sequencer>,
    config: ReaderConfig,
    firmware: Option<FirmwareVersion>,
    _state: PhantomData<State>,
}

impl<State> Device<State> {
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Block until `rx` delivers, feeding inbound chunks to the sequencer.
    ///
    /// A transport timeout aborts the chip's current command with an ACK and
    /// fails everything queued.
    fn wait<T>(&self, rx: &Receiver<Result<T>>) -> Result<T> {
        loop {
            match rx.try_recv() {
                Ok(result) => return result,
                Err(TryRecvError::Disconnected) => return Err(Error::TransactionLost),
                Err(TryRecvError::Empty) => {}
            }
            if let Err(e) = self.sequencer.pump(self.config.receive_timeout_ms) {
                debug!("pump failed: {}", e);
                if matches!(e, Error::Timeout) {
                    let _ = self.sequencer.write_ack();
                }
                self.sequencer.fail_all();
                return Err(e);
            }
        }
    }
}

impl Device<Uninitialized> {
    /// Create a Device from an existing Transport instance. This is
    /// primarily intended for tests where a MockTransport is provided.
    pub fn new_with_transport(transport: Box<dyn Transport>) -> Self {
        Self::with_config(transport, ReaderConfig::default())
    }

    pub fn with_config(transport: Box<dyn Transport>, config: ReaderConfig) -> Self {
        Self {
            sequencer: Arc::new(Sequencer::new(transport)),
            config,
            firmware: None,
            _state: PhantomData,
        }
    }

    /// Reset the transport, abort anything the chip was doing, read the
    /// firmware version and apply the CIU register setup.
    pub fn initialize(self) -> Result<Device<Initialized>> {
        self.sequencer.reset_transport()?;
        self.sequencer.write_ack()?;

        let (fw_task, fw_rx) = MessageTask::new(&Command::GetFirmwareVersion);
        self.sequencer.submit(Box::new(fw_task))?;

        let mut registers = Vec::with_capacity(INIT_REGISTERS.len());
        for reg in INIT_REGISTERS {
            let (task, rx) = SetRegisterTask::new(reg.address, reg.mask, reg.value);
            self.sequencer.submit(Box::new(task))?;
            registers.push((reg.address, rx));
        }

        let firmware = FirmwareVersion::try_from(self.wait(&fw_rx)?.as_slice())?;
        info!("reader firmware {}", firmware);
        for (address, rx) in registers {
            let value = self.wait(&rx)?;
            debug!("register {:#06x} = {:#04x}", address, value);
        }

        Ok(Device {
            sequencer: self.sequencer,
            config: self.config,
            firmware: Some(firmware),
            _state: PhantomData,
        })
    }
}

impl Device<Initialized> {
    pub fn firmware(&self) -> Option<FirmwareVersion> {
        self.firmware
    }

    /// Apply one RF configuration item.
    pub fn configure(&self, option: RfOption, enable: bool) -> Result<()> {
        let (task, rx) = MessageTask::new(&Command::RfConfiguration { option, enable });
        self.sequencer.submit(Box::new(task))?;
        self.wait(&rx).map(|_| ())
    }

    /// Field off, retry forever, field on: the state expected before
    /// [`Device::select`].
    pub fn prepare_field(&self) -> Result<()> {
        self.configure(RfOption::ActivateField, false)?;
        self.configure(RfOption::InfiniteSelect, true)?;
        self.configure(RfOption::ActivateField, true)
    }

    /// Wait for one ISO 14443-A target and open a session on it.
    pub fn select(&self) -> Result<CardSession> {
        let (task, rx) = SelectTask::new(self.config.max_select_retries);
        self.sequencer.submit(Box::new(task))?;
        let resp = self.wait(&rx)?;
        let session = CardSession::parse(&resp)?;
        info!(
            "target {} selected (tb: {})",
            bytes_to_hex(session.uid()),
            session.has_tb()
        );
        Ok(session)
    }

    /// Exchange one APDU with the selected target. The returned bytes
    /// include the card's status word.
    pub fn transmit(&self, session: &CardSession, apdu: &[u8]) -> Result<Vec<u8>> {
        let (task, rx) = TransmitTask::new(session.has_tb(), apdu);
        self.sequencer.submit(Box::new(task))?;
        self.wait(&rx)
    }

    /// Drop everything in flight.
    pub fn abort(&self) -> Result<()> {
        self.sequencer.fail_all();
        self.sequencer.write_ack()
    }

    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }
}
