use anyhow::Result;

use crate::detect::result::Inference;
use crate::frame::Frame;

/// Detector trait for running inference on frames.
///
/// `load` is called exactly once, on the inference worker thread, before any
/// call to `infer`. Implementations must treat it as the one-shot model load:
/// a failure is sticky for the process run and `infer` will never be called.
///
/// `infer` is issued strictly sequentially, one call in flight at a time, so
/// implementations do not need to be safe for concurrent use. Its latency is
/// unbounded but expected to be sub-second; a slow call only delays the next
/// result, never capture.
pub trait Detector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// One-shot model load.
    fn load(&mut self) -> Result<()>;

    /// Run inference on a frame, returning the annotated frame and the
    /// detections found in it. A failure affects this frame only.
    fn infer(&mut self, frame: &Frame) -> Result<Inference>;
}
