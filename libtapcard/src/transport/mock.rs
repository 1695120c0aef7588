// tapcard-rs/libtapcard/src/transport/mock.rs

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::constants::ACK_FRAME;
use crate::protocol::Frame;
use crate::transport::traits::Transport;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<Vec<u8>>,
    responses: VecDeque<Vec<u8>>,
    resets: usize,
    failing_sends: usize,
}

/// Mock transport for unit tests. It records sent chunks and returns queued
/// responses; an empty queue reads as `Timeout`.
///
/// Clones share state, so a test can keep one handle for assertions after
/// handing another to a `Device`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one raw inbound chunk.
    pub fn push_response(&self, resp: Vec<u8>) {
        self.state.lock().responses.push_back(resp);
    }

    pub fn push_ack(&self) {
        self.push_response(ACK_FRAME.to_vec());
    }

    /// Queue a data frame carrying `payload`.
    pub fn push_frame(&self, payload: &[u8]) -> Result<()> {
        self.push_response(Frame::encode(payload)?);
        Ok(())
    }

    /// Queue an ACK followed by a data frame in a single chunk, the way the
    /// chip often delivers them.
    pub fn push_ack_and_frame(&self, payload: &[u8]) -> Result<()> {
        let mut chunk = ACK_FRAME.to_vec();
        chunk.extend(Frame::encode(payload)?);
        self.push_response(chunk);
        Ok(())
    }

    /// Everything written so far, one entry per `send`.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent.clone()
    }

    /// Payloads of the data frames written so far. ACKs are skipped.
    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .sent
            .iter()
            .filter_map(|raw| match Frame::decode(raw) {
                Ok(Frame::Data(p)) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn pending_responses(&self) -> usize {
        self.state.lock().responses.len()
    }

    pub fn resets(&self) -> usize {
        self.state.lock().resets
    }

    /// Make the next `n` sends fail as if the reader had been unplugged.
    /// Failed sends are not recorded.
    pub fn fail_sends(&self, n: usize) {
        self.state.lock().failing_sends = n;
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut st = self.state.lock();
        if st.failing_sends > 0 {
            st.failing_sends -= 1;
            return Err(Error::DeviceNotFound);
        }
        st.sent.push(data.to_vec());
        Ok(())
    }

    fn receive(&mut self, _timeout_ms: u64) -> Result<Vec<u8>> {
        self.state
            .lock()
            .responses
            .pop_front()
            .ok_or(Error::Timeout)
    }

    fn reset(&mut self) -> Result<()> {
        // Queued responses are kept so tests can pre-seed replies before
        // handing the transport to a Device.
        let mut st = self.state.lock();
        st.sent.clear();
        st.resets += 1;
        Ok(())
    }
}
