// tapcard-rs/libtapcard/src/sequencer/tasks.rs

//! The packet-level exchanges the sequencer knows how to run.
//!
//! Each task reports its typed result on its own bounded channel when the
//! sequencer completes it.

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, trace};

use crate::constants::{PN533_CMD_IN_COMMUNICATE_THRU, PN533_CMD_IN_DATA_EXCHANGE, PN533_CMD_READ_REGISTER};
use crate::protocol::parser::expect_response;
use crate::protocol::{Command, Frame, is_response};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// What a task wants after seeing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Keep feeding frames.
    Pending,
    /// Write this payload, then keep feeding frames.
    Write(Vec<u8>),
    /// The task is finished.
    Done,
}

/// One packet-level exchange owned by the sequencer.
pub trait DriverTask: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Payload to write when the task becomes current.
    fn start(&mut self) -> Vec<u8>;

    /// Feed one inbound frame. An error aborts this task only.
    fn on_frame(&mut self, frame: Frame) -> Result<Step>;

    /// Deliver the outcome. Always called without the sequencer's lock held.
    fn complete(self: Box<Self>, outcome: Result<()>);
}

fn reply<T>(tx: &Sender<Result<T>>, value: Result<T>) {
    // The waiting side may have given up; nothing to do then.
    let _ = tx.send(value);
}

/// Send one command and wait for the frame that answers it.
pub struct MessageTask {
    msg: Vec<u8>,
    response: Option<Vec<u8>>,
    tx: Sender<Result<Vec<u8>>>,
}

impl MessageTask {
    pub fn new(cmd: &Command) -> (Self, Receiver<Result<Vec<u8>>>) {
        let (tx, rx) = bounded(1);
        let task = Self {
            msg: cmd.encode(),
            response: None,
            tx,
        };
        (task, rx)
    }
}

impl DriverTask for MessageTask {
    fn name(&self) -> &'static str {
        "message"
    }

    fn start(&mut self) -> Vec<u8> {
        self.msg.clone()
    }

    fn on_frame(&mut self, frame: Frame) -> Result<Step> {
        match frame {
            Frame::Ack => Ok(Step::Pending),
            Frame::Data(p) if is_response(&self.msg, &p) => {
                self.response = Some(p);
                Ok(Step::Done)
            }
            Frame::Data(p) => {
                debug!("message: ignoring unrelated frame {}", bytes_to_hex(&p));
                Ok(Step::Pending)
            }
        }
    }

    fn complete(self: Box<Self>, outcome: Result<()>) {
        let Self { response, tx, .. } = *self;
        let value = outcome.and_then(|_| response.ok_or(Error::TransactionLost));
        reply(&tx, value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegisterPhase {
    ReadAck,
    ReadValue,
    WriteAck,
    WriteResult,
}

/// Read-modify-write of one chip register:
/// `new = value | (original & !mask)`.
pub struct SetRegisterTask {
    address: u16,
    mask: u8,
    value: u8,
    phase: RegisterPhase,
    written: Option<u8>,
    tx: Sender<Result<u8>>,
}

impl SetRegisterTask {
    pub fn new(address: u16, mask: u8, value: u8) -> (Self, Receiver<Result<u8>>) {
        let (tx, rx) = bounded(1);
        let task = Self {
            address,
            mask,
            value,
            phase: RegisterPhase::ReadAck,
            written: None,
            tx,
        };
        (task, rx)
    }
}

impl DriverTask for SetRegisterTask {
    fn name(&self) -> &'static str {
        "set-register"
    }

    fn start(&mut self) -> Vec<u8> {
        self.phase = RegisterPhase::ReadAck;
        Command::ReadRegister {
            address: self.address,
        }
        .encode()
    }

    fn on_frame(&mut self, frame: Frame) -> Result<Step> {
        match (self.phase, frame) {
            (RegisterPhase::ReadAck, _) => {
                self.phase = RegisterPhase::ReadValue;
                Ok(Step::Pending)
            }
            (RegisterPhase::ReadValue, Frame::Ack) => Ok(Step::Pending),
            (RegisterPhase::ReadValue, Frame::Data(p)) => {
                let data = expect_response(&p, PN533_CMD_READ_REGISTER)?;
                let original = *data.first().ok_or(Error::MalformedRecord {
                    offset: p.len(),
                    reason: "register value missing",
                })?;
                let new_value = self.value | (original & !self.mask);
                trace!(
                    "register {:#06x}: {:#04x} -> {:#04x}",
                    self.address, original, new_value
                );
                self.written = Some(new_value);
                self.phase = RegisterPhase::WriteAck;
                Ok(Step::Write(
                    Command::WriteRegister {
                        address: self.address,
                        value: new_value,
                    }
                    .encode(),
                ))
            }
            (RegisterPhase::WriteAck, _) => {
                self.phase = RegisterPhase::WriteResult;
                Ok(Step::Pending)
            }
            (RegisterPhase::WriteResult, Frame::Ack) => Ok(Step::Pending),
            (RegisterPhase::WriteResult, Frame::Data(_)) => Ok(Step::Done),
        }
    }

    fn complete(self: Box<Self>, outcome: Result<()>) {
        let Self { written, tx, .. } = *self;
        let value = outcome.and_then(|_| written.ok_or(Error::TransactionLost));
        reply(&tx, value);
    }
}

/// InListPassiveTarget, re-issued while the chip reports no target.
pub struct SelectTask {
    msg: Vec<u8>,
    seen: usize,
    attempts: usize,
    max_attempts: usize,
    response: Option<Vec<u8>>,
    tx: Sender<Result<Vec<u8>>>,
}

impl SelectTask {
    /// Shortest answer that carries a target.
    pub const MIN_TARGET_RESPONSE: usize = 6;

    pub fn new(max_attempts: usize) -> (Self, Receiver<Result<Vec<u8>>>) {
        let (tx, rx) = bounded(1);
        let task = Self {
            msg: Command::InListPassiveTarget.encode(),
            seen: 0,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            response: None,
            tx,
        };
        (task, rx)
    }
}

impl DriverTask for SelectTask {
    fn name(&self) -> &'static str {
        "select"
    }

    fn start(&mut self) -> Vec<u8> {
        self.seen = 0;
        self.attempts += 1;
        self.msg.clone()
    }

    fn on_frame(&mut self, frame: Frame) -> Result<Step> {
        self.seen += 1;
        // The first frame after a write is the ACK.
        if self.seen == 1 {
            return Ok(Step::Pending);
        }
        let Frame::Data(p) = frame else {
            return Ok(Step::Pending);
        };
        if !is_response(&self.msg, &p) {
            return Ok(Step::Pending);
        }
        if p.len() >= Self::MIN_TARGET_RESPONSE {
            self.response = Some(p);
            return Ok(Step::Done);
        }
        if self.attempts >= self.max_attempts {
            debug!("select: no target after {} attempts", self.attempts);
            return Err(Error::NoCard);
        }
        debug!("select: no target, retrying");
        Ok(Step::Write(self.start()))
    }

    fn complete(self: Box<Self>, outcome: Result<()>) {
        let Self { response, tx, .. } = *self;
        let value = outcome.and_then(|_| response.ok_or(Error::NoCard));
        reply(&tx, value);
    }
}

/// One APDU exchange with the selected target.
pub struct TransmitTask {
    msg: Vec<u8>,
    response: Option<Vec<u8>>,
    tx: Sender<Result<Vec<u8>>>,
}

impl TransmitTask {
    /// `has_tb` picks InDataExchange; otherwise InCommunicateThru.
    pub fn new(has_tb: bool, apdu: &[u8]) -> (Self, Receiver<Result<Vec<u8>>>) {
        let (tx, rx) = bounded(1);
        let apdu = apdu.to_vec();
        let cmd = if has_tb {
            Command::InDataExchange { apdu }
        } else {
            Command::InCommunicateThru { apdu }
        };
        let task = Self {
            msg: cmd.encode(),
            response: None,
            tx,
        };
        (task, rx)
    }

    /// Card response carried in a chip reply.
    pub fn extract_apdu_response(resp: &[u8]) -> Result<Vec<u8>> {
        if resp.len() <= 3 {
            return Err(Error::TransactionLost);
        }
        match resp[1] {
            c if c == PN533_CMD_IN_DATA_EXCHANGE + 1 => Ok(resp[3..].to_vec()),
            c if c == PN533_CMD_IN_COMMUNICATE_THRU + 1 => Ok(resp[4..].to_vec()),
            _ => Err(Error::TransactionLost),
        }
    }
}

impl DriverTask for TransmitTask {
    fn name(&self) -> &'static str {
        "transmit"
    }

    fn start(&mut self) -> Vec<u8> {
        self.msg.clone()
    }

    fn on_frame(&mut self, frame: Frame) -> Result<Step> {
        match frame {
            Frame::Ack => Ok(Step::Pending),
            Frame::Data(p) => {
                self.response = Some(p);
                Ok(Step::Done)
            }
        }
    }

    fn complete(self: Box<Self>, outcome: Result<()>) {
        let Self { response, tx, .. } = *self;
        let value = outcome.and_then(|_| {
            let resp = response.ok_or(Error::TransactionLost)?;
            Self::extract_apdu_response(&resp)
        });
        reply(&tx, value);
    }
}
