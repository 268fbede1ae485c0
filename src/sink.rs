//! Last-value-wins hand-off to the presentation context.
//!
//! The sink carries three independent update channels: the raw frame view,
//! the latest inference update (annotated frame paired with its detection
//! summary), and free-form status text. Producers and the presentation loop
//! run on different threads; each channel swap is atomic, and an undrained
//! value is simply replaced. No buffering beyond "latest wins", mirroring the
//! frame slot's policy.

use std::sync::{Arc, Mutex};

use crate::frame::Frame;

/// An annotated frame together with the summary of what was found in it.
/// Delivered as one unit so the presentation never pairs a frame with a
/// summary from a different cycle.
#[derive(Clone, Debug)]
pub struct InferenceUpdate {
    pub annotated: Frame,
    pub summary: String,
}

#[derive(Default)]
struct SinkCells {
    raw: Mutex<Option<Frame>>,
    inference: Mutex<Option<InferenceUpdate>>,
    status: Mutex<Option<String>>,
}

/// Cloneable handle to the three update channels.
#[derive(Clone, Default)]
pub struct ResultSink {
    cells: Arc<SinkCells>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_raw(&self, frame: Frame) {
        swap_in(&self.cells.raw, frame);
    }

    pub fn publish_inference(&self, update: InferenceUpdate) {
        swap_in(&self.cells.inference, update);
    }

    pub fn publish_status(&self, status: impl Into<String>) {
        swap_in(&self.cells.status, status.into());
    }

    /// Take the latest raw frame, if one arrived since the last drain.
    pub fn take_raw(&self) -> Option<Frame> {
        swap_out(&self.cells.raw)
    }

    pub fn take_inference(&self) -> Option<InferenceUpdate> {
        swap_out(&self.cells.inference)
    }

    pub fn take_status(&self) -> Option<String> {
        swap_out(&self.cells.status)
    }
}

fn swap_in<T>(cell: &Mutex<Option<T>>, value: T) {
    let mut slot = match cell.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *slot = Some(value);
}

fn swap_out<T>(cell: &Mutex<Option<T>>) -> Option<T> {
    let mut slot = match cell.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    slot.take()
}
