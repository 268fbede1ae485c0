//! Capture devices and the tick-driven frame source.
//!
//! Device backends:
//! - Synthetic (`stub://` device strings): deterministic moving-pattern
//!   frames, no hardware required (default, testing)
//! - V4L2 (`/dev/video*` paths, feature: capture-v4l2)
//!
//! All backends produce RGB [`Frame`]s at their native resolution; the frame
//! source normalizes to the canonical resolution before hand-off. The capture
//! layer never blocks on the inference side: frames are offered to the slot,
//! which overwrites rather than queues.

mod normalize;
mod source;
mod synthetic;
#[cfg(feature = "capture-v4l2")]
mod v4l2;

pub use source::{CaptureSettings, CaptureTask};
pub use synthetic::SyntheticDevice;
#[cfg(feature = "capture-v4l2")]
pub use v4l2::V4l2Device;

use crate::error::PipelineError;
use crate::frame::Frame;

/// A capture device owned exclusively by the frame source.
///
/// `read` failures are transient: the tick is skipped and capture continues.
/// `release` must be idempotent; the frame source calls it exactly once when
/// its thread exits, and a second call must be a no-op, not a fault.
pub trait CaptureDevice: Send {
    /// Human-readable device identifier for logs.
    fn describe(&self) -> String;

    /// Capture the next frame at the device's native resolution.
    fn read(&mut self) -> Result<Frame, PipelineError>;

    /// Release the underlying device. Idempotent.
    fn release(&mut self);
}

/// Acquire the capture device named by the settings.
///
/// `stub://` strings select the synthetic backend; anything else is treated
/// as a V4L2 device path and requires the capture-v4l2 feature.
pub fn open_device(settings: &CaptureSettings) -> Result<Box<dyn CaptureDevice>, PipelineError> {
    if settings.device.starts_with("stub://") {
        return Ok(Box::new(SyntheticDevice::new(settings.clone())));
    }

    #[cfg(feature = "capture-v4l2")]
    {
        Ok(Box::new(V4l2Device::open(settings.clone())?))
    }
    #[cfg(not(feature = "capture-v4l2"))]
    {
        Err(PipelineError::DeviceUnavailable {
            device: settings.device.clone(),
            reason: "hardware capture requires the capture-v4l2 feature".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn stub_device_strings_select_the_synthetic_backend() {
        let settings = CaptureSettings {
            device: "stub://cam0".to_string(),
            width: 64,
            height: 48,
            tick_interval: Duration::from_millis(50),
        };
        let device = open_device(&settings).unwrap();
        assert!(device.describe().contains("stub://cam0"));
    }

    #[cfg(not(feature = "capture-v4l2"))]
    #[test]
    fn hardware_paths_fail_without_the_v4l2_feature() {
        let settings = CaptureSettings {
            device: "/dev/video99".to_string(),
            width: 64,
            height: 48,
            tick_interval: Duration::from_millis(50),
        };
        let err = match open_device(&settings) {
            Err(err) => err,
            Ok(_) => panic!("expected open_device to fail without the capture-v4l2 feature"),
        };
        assert!(matches!(err, PipelineError::DeviceUnavailable { .. }));
    }
}
