//! Tick-driven frame source.
//!
//! One frame per tick: read from the device, normalize to the canonical
//! resolution, publish the raw view, and offer to the inference slot only
//! while detection is running. A failed read skips the tick and capture
//! continues; transient camera hiccups must not terminate the loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::capture::{normalize, CaptureDevice};
use crate::sink::ResultSink;
use crate::slot::LatestFrameSlot;

/// Settings for one capture session.
#[derive(Clone, Debug)]
pub struct CaptureSettings {
    /// Device string: `stub://name` or a V4L2 device path.
    pub device: String,
    /// Canonical frame width after normalization.
    pub width: u32,
    /// Canonical frame height after normalization.
    pub height: u32,
    /// Capture cadence.
    pub tick_interval: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            device: "stub://cam0".to_string(),
            width: 640,
            height: 480,
            tick_interval: Duration::from_millis(50),
        }
    }
}

/// Handle to the capture thread.
///
/// `stop` is synchronous: once it returns, the thread has exited and the
/// device has been released, so no frame is captured afterwards. Dropping the
/// handle stops the thread the same way.
pub struct CaptureTask {
    stop: Arc<AtomicBool>,
    frames_produced: Arc<AtomicU64>,
    join: Option<JoinHandle<()>>,
}

impl CaptureTask {
    /// Spawn the tick loop. The device moves into the thread and is released
    /// exactly once when the loop exits.
    pub fn spawn(
        mut device: Box<dyn CaptureDevice>,
        settings: CaptureSettings,
        detecting: Arc<AtomicBool>,
        slot: Arc<LatestFrameSlot>,
        sink: ResultSink,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let frames_produced = Arc::new(AtomicU64::new(0));

        let thread_stop = stop.clone();
        let thread_frames = frames_produced.clone();
        let join = std::thread::spawn(move || {
            log::info!(
                "capture started: {} at {}x{} every {:?}",
                device.describe(),
                settings.width,
                settings.height,
                settings.tick_interval
            );
            while !thread_stop.load(Ordering::SeqCst) {
                let tick_started = Instant::now();
                let produced = run_tick(
                    device.as_mut(),
                    &settings,
                    detecting.load(Ordering::SeqCst),
                    &slot,
                    &sink,
                );
                if produced {
                    thread_frames.fetch_add(1, Ordering::Relaxed);
                }
                if let Some(remaining) =
                    settings.tick_interval.checked_sub(tick_started.elapsed())
                {
                    std::thread::sleep(remaining);
                }
            }
            device.release();
            log::info!(
                "capture stopped after {} frames",
                thread_frames.load(Ordering::Relaxed)
            );
        });

        Self {
            stop,
            frames_produced,
            join: Some(join),
        }
    }

    /// Frames successfully produced so far.
    pub fn frames_produced(&self) -> u64 {
        self.frames_produced.load(Ordering::Relaxed)
    }

    /// Stop ticking and wait for the thread to exit. Returns once the device
    /// has been released; completes within roughly one tick interval.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One capture tick. Returns whether a frame was produced.
pub(crate) fn run_tick(
    device: &mut dyn CaptureDevice,
    settings: &CaptureSettings,
    detecting: bool,
    slot: &LatestFrameSlot,
    sink: &ResultSink,
) -> bool {
    let frame = match device.read() {
        Ok(frame) => frame,
        Err(err) => {
            log::warn!("capture tick skipped: {}", err);
            sink.publish_status(err.to_string());
            return false;
        }
    };

    let frame = match normalize::fit(frame, settings.width, settings.height) {
        Ok(frame) => frame,
        Err(err) => {
            log::warn!("frame normalization failed, tick skipped: {}", err);
            sink.publish_status(format!("frame read failed: {}", err));
            return false;
        }
    };

    sink.publish_raw(frame.clone());
    if detecting && slot.offer(frame) {
        log::trace!("stale frame replaced in slot");
    }
    true
}
