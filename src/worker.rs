//! Background inference worker.
//!
//! Two phases, lazy and one-shot. Phase 1 loads the detection model: the
//! shared [`ModelState`] moves from `Loading` to `Ready` or, on failure, to
//! `Failed` for the remainder of the run (no automatic retry). Phase 2, only
//! entered after a successful load, blocks on the frame slot, runs inference,
//! and publishes (annotated frame, summary) through the sink. A single bad
//! frame is reported and skipped; it never stops the worker.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::detect::{summarize, Detector};
use crate::error::PipelineError;
use crate::sink::{InferenceUpdate, ResultSink};
use crate::slot::LatestFrameSlot;

/// Model lifecycle. Written exactly once after `Loading`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelState {
    Loading,
    Ready,
    Failed(String),
}

impl ModelState {
    /// Fresh shared handle in the `Loading` state.
    pub fn shared() -> SharedModelState {
        Arc::new(Mutex::new(ModelState::Loading))
    }
}

pub type SharedModelState = Arc<Mutex<ModelState>>;

/// Read the current model state.
pub fn model_state(state: &SharedModelState) -> ModelState {
    match state.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn set_model_state(state: &SharedModelState, value: ModelState) {
    let mut guard = match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = value;
}

/// Handle to the inference thread.
pub struct InferenceWorker {
    join: Option<JoinHandle<()>>,
}

impl InferenceWorker {
    /// Spawn the worker. It exits when the slot is shut down (or immediately
    /// after a failed model load).
    pub fn spawn(
        detector: Box<dyn Detector>,
        slot: Arc<LatestFrameSlot>,
        sink: ResultSink,
        model_state: SharedModelState,
        cycle_delay: Duration,
    ) -> Self {
        let join = std::thread::spawn(move || {
            run(detector, &slot, &sink, &model_state, cycle_delay);
        });
        Self { join: Some(join) }
    }

    /// Wait for the worker to exit. Shut the slot down first, or this blocks
    /// until a frame arrives.
    pub fn join(mut self) {
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("inference worker thread panicked");
            }
        }
    }
}

fn run(
    mut detector: Box<dyn Detector>,
    slot: &LatestFrameSlot,
    sink: &ResultSink,
    model_state: &SharedModelState,
    cycle_delay: Duration,
) {
    sink.publish_status(format!("loading {} model...", detector.name()));
    match detector.load() {
        Ok(()) => {
            set_model_state(model_state, ModelState::Ready);
            log::info!("{} model ready", detector.name());
            sink.publish_status(format!("{} model ready", detector.name()));
        }
        Err(err) => {
            let reason = format!("{:#}", err);
            let failure = PipelineError::ModelLoadFailed(reason.clone());
            set_model_state(model_state, ModelState::Failed(reason));
            log::error!("{}", failure);
            sink.publish_status(failure.to_string());
            return;
        }
    }

    while let Some(frame) = slot.take_blocking() {
        run_inference_cycle(detector.as_mut(), &frame, sink);
        // Caps the inference issue rate independent of how fast frames arrive.
        std::thread::sleep(cycle_delay);
    }
    log::info!("inference worker stopped");
}

/// One inference cycle. An inference failure is reported through the sink and
/// the cycle ends; the caller continues with the next frame.
pub(crate) fn run_inference_cycle(
    detector: &mut dyn Detector,
    frame: &crate::frame::Frame,
    sink: &ResultSink,
) {
    match detector.infer(frame) {
        Ok(inference) => {
            let summary = summarize(&inference.detections);
            log::debug!(
                "frame {}: {} detection(s)",
                frame.seq,
                inference.detections.len()
            );
            sink.publish_inference(InferenceUpdate {
                annotated: inference.annotated,
                summary,
            });
        }
        Err(err) => {
            let failure = PipelineError::InferenceFailed(format!("{:#}", err));
            log::warn!("frame {}: {}", frame.seq, failure);
            sink.publish_status(failure.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, Inference};
    use crate::frame::Frame;
    use anyhow::anyhow;

    struct ScriptedDetector {
        calls: u64,
        fail_load: bool,
        fail_on_call: Option<u64>,
    }

    impl ScriptedDetector {
        fn new() -> Self {
            Self {
                calls: 0,
                fail_load: false,
                fail_on_call: None,
            }
        }
    }

    impl Detector for ScriptedDetector {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn load(&mut self) -> anyhow::Result<()> {
            if self.fail_load {
                return Err(anyhow!("model file corrupt"));
            }
            Ok(())
        }

        fn infer(&mut self, frame: &Frame) -> anyhow::Result<Inference> {
            self.calls += 1;
            if self.fail_on_call == Some(self.calls) {
                return Err(anyhow!("tensor shape mismatch"));
            }
            Ok(Inference {
                annotated: frame.clone(),
                detections: vec![Detection::new("person", 0.9)],
            })
        }
    }

    fn frame(seq: u64) -> Frame {
        Frame::new(vec![seq as u8; 12], 2, 2, 3, seq).unwrap()
    }

    #[test]
    fn a_failed_cycle_does_not_stop_the_worker() {
        let mut detector = ScriptedDetector::new();
        detector.fail_on_call = Some(2);
        let sink = ResultSink::new();

        let mut updates = 0;
        let mut errors = Vec::new();
        for seq in 1..=3 {
            run_inference_cycle(&mut detector, &frame(seq), &sink);
            if let Some(update) = sink.take_inference() {
                updates += 1;
                assert_eq!(update.annotated.seq, seq);
            }
            if let Some(status) = sink.take_status() {
                errors.push((seq, status));
            }
        }

        // Results for frames 1 and 3, one error message for frame 2.
        assert_eq!(updates, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, 2);
        assert!(errors[0].1.starts_with("inference failed:"));
        assert!(errors[0].1.contains("tensor shape mismatch"));
    }

    #[test]
    fn successful_cycle_pairs_annotation_with_summary() {
        let mut detector = ScriptedDetector::new();
        let sink = ResultSink::new();

        run_inference_cycle(&mut detector, &frame(1), &sink);
        let update = sink.take_inference().unwrap();
        assert_eq!(update.summary, "detected 1 object:\nperson: 0.90");
    }

    #[test]
    fn load_failure_is_sticky_and_surfaced() {
        let mut detector = ScriptedDetector::new();
        detector.fail_load = true;
        let slot = Arc::new(LatestFrameSlot::new());
        let sink = ResultSink::new();
        let state = ModelState::shared();

        let worker = InferenceWorker::spawn(
            Box::new(detector),
            slot.clone(),
            sink.clone(),
            state.clone(),
            Duration::from_millis(1),
        );
        // Worker exits on its own after a failed load; no shutdown needed.
        worker.join();

        match model_state(&state) {
            ModelState::Failed(reason) => assert!(reason.contains("model file corrupt")),
            other => panic!("expected Failed, got {:?}", other),
        }
        let status = sink.take_status().unwrap();
        assert!(status.contains("model load failed"));
    }

    #[test]
    fn worker_drains_the_slot_until_shutdown() {
        let slot = Arc::new(LatestFrameSlot::new());
        let sink = ResultSink::new();
        let state = ModelState::shared();

        let worker = InferenceWorker::spawn(
            Box::new(ScriptedDetector::new()),
            slot.clone(),
            sink.clone(),
            state.clone(),
            Duration::from_millis(1),
        );

        // Wait for the load phase to finish.
        while model_state(&state) == ModelState::Loading {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(model_state(&state), ModelState::Ready);

        slot.offer(frame(1));
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let update = loop {
            if let Some(update) = sink.take_inference() {
                break update;
            }
            assert!(std::time::Instant::now() < deadline, "no inference update");
            std::thread::sleep(Duration::from_millis(2));
        };
        assert_eq!(update.annotated.seq, 1);

        slot.shutdown();
        worker.join();
    }
}
