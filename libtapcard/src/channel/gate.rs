// tapcard-rs/libtapcard/src/channel/gate.rs

use log::warn;
use parking_lot::{Condvar, Mutex};

/// Mutual-exclusion gate for card transactions.
///
/// Unlike a mutex guard the holder releases it explicitly, which lets
/// `begin_transaction` and `end_transaction` be separate calls.
#[derive(Debug, Default)]
pub struct TransactionGate {
    held: Mutex<bool>,
    changed: Condvar,
}

impl TransactionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the gate is free, then take it.
    pub fn acquire(&self) {
        let mut held = self.held.lock();
        while *held {
            self.changed.wait(&mut held);
        }
        *held = true;
    }

    /// Take the gate if it is free.
    pub fn try_acquire(&self) -> bool {
        let mut held = self.held.lock();
        if *held {
            return false;
        }
        *held = true;
        true
    }

    /// Release the gate and wake one waiter. Returns false when the gate was
    /// not held.
    pub fn release(&self) -> bool {
        let mut held = self.held.lock();
        if !*held {
            warn!("transaction gate released while free");
            return false;
        }
        *held = false;
        drop(held);
        self.changed.notify_one();
        true
    }

    pub fn is_held(&self) -> bool {
        *self.held.lock()
    }
}
