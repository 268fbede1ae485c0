use thiserror::Error;

/// Pipeline error taxonomy.
///
/// Per-frame errors (`ReadFailed`, `InferenceFailed`) are transient and
/// self-healing by retry-next-frame. Lifecycle precondition errors
/// (`DeviceNotOpen`, `ModelNotReady`) are synchronous rejections with no side
/// effect. `ModelLoadFailed` is sticky for the remainder of the process run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The capture device could not be acquired. Session state is unchanged.
    #[error("capture device '{device}' unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// `start_detection` was called while the session is closed.
    #[error("capture device is not open")]
    DeviceNotOpen,

    /// `start_detection` was called before the detection model became ready.
    #[error("detection model is not ready")]
    ModelNotReady,

    /// The one-shot model load failed. Never retried within a run.
    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    /// A single capture tick failed. The capture loop skips it and continues.
    #[error("frame read failed: {0}")]
    ReadFailed(String),

    /// A single inference cycle failed. The worker reports it and continues.
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}
