// tapcard-rs/libtapcard/src/channel/scripted.rs

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::channel::gate::TransactionGate;
use crate::channel::{CardChannel, ReaderKind};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Exchange {
    expect: Option<Vec<u8>>,
    response: Vec<u8>,
}

#[derive(Debug, Default)]
struct ScriptState {
    script: VecDeque<Exchange>,
    sent: Vec<Vec<u8>>,
    transactions: usize,
}

/// Card channel answering from a script, for tests and demos.
///
/// Each APDU consumes the next scripted exchange. An exchange added with
/// [`ScriptedChannel::expect`] also checks the APDU it receives. A
/// transmit past the end of the script fails with `NoCard`.
#[derive(Debug)]
pub struct ScriptedChannel {
    kind: ReaderKind,
    state: Mutex<ScriptState>,
    gate: TransactionGate,
    card_present: bool,
}

impl ScriptedChannel {
    pub fn new(kind: ReaderKind) -> Self {
        Self {
            kind,
            state: Mutex::new(ScriptState::default()),
            gate: TransactionGate::new(),
            card_present: true,
        }
    }

    pub fn contactless() -> Self {
        Self::new(ReaderKind::Contactless)
    }

    pub fn contact() -> Self {
        Self::new(ReaderKind::Contact)
    }

    /// A reader with no card: `begin_transaction` reports false.
    pub fn empty(kind: ReaderKind) -> Self {
        Self {
            card_present: false,
            ..Self::new(kind)
        }
    }

    /// Answer the next APDU, whatever it is, with `response`.
    pub fn respond(self, response: &[u8]) -> Self {
        self.state.lock().script.push_back(Exchange {
            expect: None,
            response: response.to_vec(),
        });
        self
    }

    /// Answer the next APDU with `response` if it equals `apdu`.
    pub fn expect(self, apdu: &[u8], response: &[u8]) -> Self {
        self.state.lock().script.push_back(Exchange {
            expect: Some(apdu.to_vec()),
            response: response.to_vec(),
        });
        self
    }

    /// APDUs received so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent.clone()
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().script.len()
    }

    /// Completed `begin_transaction` calls.
    pub fn transactions(&self) -> usize {
        self.state.lock().transactions
    }
}

impl CardChannel for ScriptedChannel {
    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>> {
        let mut st = self.state.lock();
        st.sent.push(apdu.to_vec());
        let exchange = st.script.pop_front().ok_or(Error::NoCard)?;
        match exchange.expect {
            Some(expected) if expected != apdu => Err(Error::UnsupportedOperation(format!(
                "scripted {} but got {}",
                bytes_to_hex(&expected),
                bytes_to_hex(apdu)
            ))),
            _ => Ok(exchange.response),
        }
    }

    fn begin_transaction(&self) -> Result<bool> {
        if !self.card_present {
            return Ok(false);
        }
        self.gate.acquire();
        self.state.lock().transactions += 1;
        Ok(true)
    }

    fn end_transaction(&self, _keep: bool) -> Result<()> {
        self.gate.release();
        Ok(())
    }

    fn kind(&self) -> ReaderKind {
        self.kind
    }
}
