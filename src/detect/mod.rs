//! Inference boundary.
//!
//! The model is treated as a black box behind the [`Detector`] trait:
//! `infer(frame) -> (annotated frame, detections)`, synchronous, with
//! unbounded but typically sub-second latency. Backends:
//! - `stub`: frame-hash motion detection, no model file (default, testing)
//! - `tract`: local ONNX models (feature: backend-tract)

mod annotate;
mod backend;
mod backends;
mod result;

pub use annotate::annotate;
pub use backend::Detector;
pub use backends::StubDetector;
#[cfg(feature = "backend-tract")]
pub use backends::TractDetector;
pub use result::{summarize, Detection, Inference, SUMMARY_LIMIT};
