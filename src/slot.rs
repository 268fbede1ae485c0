//! Single-slot frame mailbox between capture and inference.
//!
//! The slot holds at most one frame. Offering while a frame is pending
//! replaces it: inference always works on the newest available frame, never a
//! queue of stale ones. `offer` never blocks the producer, which is what keeps
//! capture cadence independent of inference latency. The consumer blocks in
//! `take_blocking` until a frame arrives or the slot is shut down.

use std::sync::{Condvar, Mutex, MutexGuard};

use crate::frame::Frame;

#[derive(Default)]
struct SlotState {
    frame: Option<Frame>,
    shutdown: bool,
}

/// Overwrite-on-full frame mailbox. One logical writer, exactly one reader.
#[derive(Default)]
pub struct LatestFrameSlot {
    state: Mutex<SlotState>,
    available: Condvar,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame, replacing any pending one. Never blocks.
    ///
    /// Returns `true` when a pending (now stale) frame was dropped.
    pub fn offer(&self, frame: Frame) -> bool {
        let mut state = self.lock();
        let replaced = state.frame.replace(frame).is_some();
        self.available.notify_one();
        replaced
    }

    /// Block until a frame is available, then atomically clear and return it.
    ///
    /// Returns `None` only after `shutdown` with no frame pending; a pending
    /// frame is still handed out so the consumer can finish it.
    pub fn take_blocking(&self) -> Option<Frame> {
        let mut state = self.lock();
        loop {
            if let Some(frame) = state.frame.take() {
                return Some(frame);
            }
            if state.shutdown {
                return None;
            }
            state = match self.available.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Drop any pending frame without waking the consumer.
    pub fn clear(&self) {
        self.lock().frame = None;
    }

    /// Wake the consumer and make all future takes return `None`.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.shutdown = true;
        self.available.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
