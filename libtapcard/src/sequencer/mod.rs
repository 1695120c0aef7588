// tapcard-rs/libtapcard/src/sequencer/mod.rs

//! Command sequencer for the reader chip.
//!
//! The wire protocol has no request tags, so at most one task is current.
//! Later submissions wait in a FIFO queue. Inbound bytes are reassembled
//! into frames and dispatched to the current task under the state lock;
//! finished tasks move to a completion queue that is drained after the lock
//! is released, and the next task's first write also happens outside it.

pub mod tasks;

use std::collections::VecDeque;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::constants::ACK_FRAME;
use crate::protocol::{Frame, FrameReader};
use crate::transport::Transport;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

pub use tasks::{DriverTask, MessageTask, SelectTask, SetRegisterTask, Step, TransmitTask};

type Finished = (Box<dyn DriverTask>, Result<()>);

#[derive(Default)]
struct SequencerState {
    current: Option<Box<dyn DriverTask>>,
    queue: VecDeque<Box<dyn DriverTask>>,
    completed: VecDeque<Finished>,
    reader: FrameReader,
}

impl SequencerState {
    /// Retire the current task and promote the next one. Returns the
    /// promoted task's first payload, to be written once unlocked.
    fn finish_current(&mut self, outcome: Result<()>) -> Option<Vec<u8>> {
        if let Some(task) = self.current.take() {
            debug!("task {} finished (ok: {})", task.name(), outcome.is_ok());
            self.completed.push_back((task, outcome));
        }
        let mut next = self.queue.pop_front()?;
        let payload = next.start();
        self.current = Some(next);
        Some(payload)
    }
}

pub struct Sequencer {
    state: Mutex<SequencerState>,
    transport: Mutex<Box<dyn Transport>>,
}

impl Sequencer {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            state: Mutex::new(SequencerState::default()),
            transport: Mutex::new(transport),
        }
    }

    /// Queue a task; it starts immediately when nothing is current.
    pub fn submit(&self, task: Box<dyn DriverTask>) -> Result<()> {
        let start = {
            let mut st = self.state.lock();
            if st.current.is_some() {
                trace!("queueing task {} behind {}", task.name(), st.queue.len());
                st.queue.push_back(task);
                None
            } else {
                let mut task = task;
                let payload = task.start();
                st.current = Some(task);
                Some(payload)
            }
        };
        match start {
            Some(payload) => self.write_or_fail_all(&payload),
            None => Ok(()),
        }
    }

    /// Read one chunk from the transport and dispatch it.
    pub fn pump(&self, timeout_ms: u64) -> Result<()> {
        let chunk = self.transport.lock().receive(timeout_ms)?;
        self.on_read(&chunk)
    }

    /// Dispatch an inbound chunk. Errors returned here come from writing
    /// follow-up commands; frame and task errors are delivered to the task.
    pub fn on_read(&self, chunk: &[u8]) -> Result<()> {
        self.state.lock().reader.push(chunk);

        let mut result = Ok(());
        loop {
            let write = {
                let mut st = self.state.lock();
                match st.reader.next_frame() {
                    Ok(Some(frame)) => Self::dispatch(&mut st, frame),
                    Ok(None) => break,
                    Err(e) => {
                        if st.current.is_some() {
                            st.finish_current(Err(e))
                        } else {
                            warn!("framing error with no current task: {}", e);
                            None
                        }
                    }
                }
            };
            if let Some(payload) = write {
                if let Err(e) = self.write_or_fail_all(&payload) {
                    result = Err(e);
                    break;
                }
            }
        }

        self.drain_completions();
        result
    }

    fn dispatch(st: &mut SequencerState, frame: Frame) -> Option<Vec<u8>> {
        let Some(task) = st.current.as_mut() else {
            warn!("dropping {:?} with no current task", frame);
            return None;
        };
        match task.on_frame(frame) {
            Ok(Step::Pending) => None,
            Ok(Step::Write(payload)) => Some(payload),
            Ok(Step::Done) => st.finish_current(Ok(())),
            Err(e) => st.finish_current(Err(e)),
        }
    }

    /// Fail the current task and everything queued with `TransactionLost`.
    /// Buffered partial frames are discarded.
    pub fn fail_all(&self) {
        {
            let mut st = self.state.lock();
            st.reader.clear();
            let current = st.current.take();
            let queued: Vec<_> = st.queue.drain(..).collect();
            for task in current.into_iter().chain(queued) {
                st.completed.push_back((task, Err(Error::TransactionLost)));
            }
        }
        self.drain_completions();
    }

    /// Write a bare ACK; the chip takes it as "abort the current command".
    pub fn write_ack(&self) -> Result<()> {
        trace!("tx ack");
        self.transport.lock().send(&ACK_FRAME)
    }

    pub fn is_idle(&self) -> bool {
        let st = self.state.lock();
        st.current.is_none() && st.queue.is_empty()
    }

    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Reset the underlying transport.
    pub fn reset_transport(&self) -> Result<()> {
        self.transport.lock().reset()
    }

    /// A current task whose payload never reached the chip has nothing left
    /// to wait for, and neither has anything queued behind it.
    fn write_or_fail_all(&self, payload: &[u8]) -> Result<()> {
        let result = self.write_payload(payload);
        if let Err(e) = &result {
            warn!("write failed, dropping queued tasks: {}", e);
            self.fail_all();
        }
        result
    }

    fn write_payload(&self, payload: &[u8]) -> Result<()> {
        let bytes = Frame::encode(payload)?;
        trace!("tx {}", bytes_to_hex(payload));
        self.transport.lock().send(&bytes)
    }

    fn drain_completions(&self) {
        loop {
            let next = self.state.lock().completed.pop_front();
            match next {
                Some((task, outcome)) => task.complete(outcome),
                None => break,
            }
        }
    }
}
