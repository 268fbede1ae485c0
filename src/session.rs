//! Session lifecycle.
//!
//! The controller is the one owner of session state: the capture device
//! (closed or open) and detection (idle or running). Consumers read the state
//! through shared flags; they never mutate it. Transitions are synchronous:
//! when `close_device` returns, the capture thread has exited and the device
//! has been released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::{open_device, CaptureSettings, CaptureTask};
use crate::error::PipelineError;
use crate::sink::ResultSink;
use crate::slot::LatestFrameSlot;
use crate::worker::{model_state, ModelState, SharedModelState};

/// The open/closed + detecting/idle lifecycle of one capture+inference run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
    Detecting,
}

pub struct SessionController {
    settings: CaptureSettings,
    slot: Arc<LatestFrameSlot>,
    sink: ResultSink,
    model: SharedModelState,
    /// Read by the capture thread each tick to gate slot offers.
    detecting: Arc<AtomicBool>,
    capture: Option<CaptureTask>,
}

impl SessionController {
    pub fn new(
        settings: CaptureSettings,
        slot: Arc<LatestFrameSlot>,
        sink: ResultSink,
        model: SharedModelState,
    ) -> Self {
        Self {
            settings,
            slot,
            sink,
            model,
            detecting: Arc::new(AtomicBool::new(false)),
            capture: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.capture, self.detecting.load(Ordering::SeqCst)) {
            (None, _) => SessionState::Closed,
            (Some(_), false) => SessionState::Open,
            (Some(_), true) => SessionState::Detecting,
        }
    }

    /// Closed -> Open. Acquires the device and starts the tick loop.
    ///
    /// Fails with `DeviceUnavailable` when the device cannot be acquired;
    /// state stays Closed. Opening an already-open session is a no-op.
    pub fn open_device(&mut self) -> Result<(), PipelineError> {
        if self.capture.is_some() {
            return Ok(());
        }

        let device = open_device(&self.settings)?;
        let task = CaptureTask::spawn(
            device,
            self.settings.clone(),
            self.detecting.clone(),
            self.slot.clone(),
            self.sink.clone(),
        );
        self.capture = Some(task);
        self.sink.publish_status("camera opened");
        Ok(())
    }

    /// Open or Detecting -> Closed. Always succeeds; double close is a no-op.
    ///
    /// Stops detection first, then stops the capture thread synchronously and
    /// drops any frame still pending in the slot, so a closed session has no
    /// capture activity and no pending slot contents.
    pub fn close_device(&mut self) {
        self.stop_detection();
        let Some(mut task) = self.capture.take() else {
            return;
        };
        task.stop();
        self.slot.clear();
        self.sink.publish_status("camera closed");
    }

    /// Open -> Detecting.
    ///
    /// Rejected with `DeviceNotOpen` when closed and `ModelNotReady` unless
    /// the model load has completed; neither rejection changes state.
    pub fn start_detection(&mut self) -> Result<(), PipelineError> {
        if self.capture.is_none() {
            return Err(PipelineError::DeviceNotOpen);
        }
        match model_state(&self.model) {
            ModelState::Ready => {}
            ModelState::Loading | ModelState::Failed(_) => {
                return Err(PipelineError::ModelNotReady);
            }
        }

        self.detecting.store(true, Ordering::SeqCst);
        self.sink.publish_status("detection running");
        log::info!("detection started");
        Ok(())
    }

    /// Detecting -> Open. Not an error when detection is already stopped.
    pub fn stop_detection(&mut self) {
        if self.detecting.swap(false, Ordering::SeqCst) {
            self.sink.publish_status("detection stopped");
            log::info!("detection stopped");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.close_device();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn controller(model: SharedModelState) -> SessionController {
        let settings = CaptureSettings {
            device: "stub://session-test".to_string(),
            width: 16,
            height: 16,
            tick_interval: Duration::from_millis(5),
        };
        SessionController::new(
            settings,
            Arc::new(LatestFrameSlot::new()),
            ResultSink::new(),
            model,
        )
    }

    fn ready_model() -> SharedModelState {
        let model = ModelState::shared();
        *model.lock().unwrap() = ModelState::Ready;
        model
    }

    #[test]
    fn start_detection_before_open_fails_and_stays_closed() {
        let mut session = controller(ready_model());
        let err = session.start_detection().unwrap_err();
        assert!(matches!(err, PipelineError::DeviceNotOpen));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn start_detection_requires_a_ready_model() {
        let model = ModelState::shared();
        let mut session = controller(model.clone());
        session.open_device().unwrap();

        // Still loading.
        let err = session.start_detection().unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotReady));
        assert_eq!(session.state(), SessionState::Open);

        // Failed is equally not ready.
        *model.lock().unwrap() = ModelState::Failed("corrupt".to_string());
        let err = session.start_detection().unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotReady));
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn lifecycle_transitions() {
        let mut session = controller(ready_model());
        assert_eq!(session.state(), SessionState::Closed);

        session.open_device().unwrap();
        assert_eq!(session.state(), SessionState::Open);

        // Re-opening is a no-op.
        session.open_device().unwrap();
        assert_eq!(session.state(), SessionState::Open);

        session.start_detection().unwrap();
        assert_eq!(session.state(), SessionState::Detecting);

        session.stop_detection();
        assert_eq!(session.state(), SessionState::Open);
        // Stopping again is a no-op, not an error.
        session.stop_detection();
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn close_is_idempotent() {
        let mut session = controller(ready_model());
        session.open_device().unwrap();
        session.start_detection().unwrap();

        session.close_device();
        assert_eq!(session.state(), SessionState::Closed);

        // Second close: no error, no second release.
        session.close_device();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn close_clears_pending_slot_contents() {
        let slot = Arc::new(LatestFrameSlot::new());
        let model = ready_model();
        let settings = CaptureSettings {
            device: "stub://clear-test".to_string(),
            width: 16,
            height: 16,
            tick_interval: Duration::from_millis(5),
        };
        let mut session =
            SessionController::new(settings, slot.clone(), ResultSink::new(), model);

        session.open_device().unwrap();
        session.start_detection().unwrap();
        // Let a few ticks land in the slot.
        std::thread::sleep(Duration::from_millis(30));
        session.close_device();

        slot.shutdown();
        assert!(slot.take_blocking().is_none());
    }
}
