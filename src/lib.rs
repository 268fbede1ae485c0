//! lookout - live camera detection pipeline
//!
//! Captures live video at a fixed cadence, routes frames through a slow,
//! variable-latency inference step, and hands both raw and annotated frames
//! to a presentation context, keeping the capture rate decoupled from the
//! inference rate.
//!
//! # Architecture
//!
//! ```text
//! CaptureTask --> LatestFrameSlot --> InferenceWorker --> ResultSink
//!    (tick)      (overwrite-on-full)   (blocking drain)   (latest wins)
//! ```
//!
//! - `capture`: device backends and the tick-driven frame source
//! - `slot`: single-slot overwrite-on-full mailbox; the producer never blocks
//! - `detect`: the inference boundary (`Detector` trait and backends)
//! - `worker`: one-shot model load, then the blocking inference loop
//! - `sink`: last-value-wins delivery to the presentation thread
//! - `session`: the state machine gating device and detection lifecycle
//!
//! The only designed blocking point is the worker's take from the slot; the
//! capture side always overwrites, and the presentation side only drains.

pub mod capture;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod session;
pub mod sink;
pub mod slot;
pub mod worker;

pub use capture::{open_device, CaptureDevice, CaptureSettings, CaptureTask};
pub use config::{DetectorSettings, LookoutConfig};
pub use detect::{summarize, Detection, Detector, Inference, StubDetector, SUMMARY_LIMIT};
#[cfg(feature = "backend-tract")]
pub use detect::TractDetector;
pub use error::PipelineError;
pub use frame::Frame;
pub use session::{SessionController, SessionState};
pub use sink::{InferenceUpdate, ResultSink};
pub use slot::LatestFrameSlot;
pub use worker::{model_state, InferenceWorker, ModelState, SharedModelState};
