//! lookoutd - live camera detection daemon
//!
//! Wires the pipeline end to end:
//! 1. Spawns the inference worker, which loads the detection model once
//! 2. Opens the capture device and starts the tick loop
//! 3. Starts detection as soon as the model is ready
//! 4. Drains the result sink on a presentation loop and logs updates
//!
//! The presentation loop is the console stand-in for a UI event loop: it only
//! reacts to delivered results, never blocks on capture or inference.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Parser;

use lookout::{
    model_state, InferenceWorker, LatestFrameSlot, LookoutConfig, ModelState, ResultSink,
    SessionController, StubDetector,
};

const PRESENTATION_INTERVAL: Duration = Duration::from_millis(100);
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "lookoutd", about = "Live camera detection daemon")]
struct Args {
    /// Config file (TOML). Defaults to the LOOKOUT_CONFIG env var.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Capture device override: stub://name or a V4L2 device path.
    #[arg(long, env = "LOOKOUT_DEVICE")]
    device: Option<String>,

    /// Exit after this many seconds (for smoke runs). Runs until Ctrl-C when
    /// unset.
    #[arg(long)]
    run_secs: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = LookoutConfig::load_with_path(args.config.as_deref())?;
    if let Some(device) = args.device {
        cfg.capture.device = device;
    }

    log::info!(
        "lookoutd {}: device={} canvas={}x{} tick={:?} backend={}",
        env!("CARGO_PKG_VERSION"),
        cfg.capture.device,
        cfg.capture.width,
        cfg.capture.height,
        cfg.capture.tick_interval,
        cfg.detector.backend
    );

    let slot = Arc::new(LatestFrameSlot::new());
    let sink = ResultSink::new();
    let model = ModelState::shared();

    let detector = build_detector(&cfg)?;
    let worker = InferenceWorker::spawn(
        detector,
        slot.clone(),
        sink.clone(),
        model.clone(),
        cfg.detector.cycle_delay,
    );

    let mut session = SessionController::new(
        cfg.capture.clone(),
        slot.clone(),
        sink.clone(),
        model.clone(),
    );
    session.open_device()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_handler.store(true, Ordering::SeqCst);
    })?;

    let started = Instant::now();
    let mut last_health_log = Instant::now();
    let mut raw_frames_seen = 0u64;
    let mut results_seen = 0u64;
    let mut load_failure_reported = false;

    while !shutdown.load(Ordering::SeqCst) {
        if let Some(limit) = args.run_secs {
            if started.elapsed() >= Duration::from_secs(limit) {
                log::info!("run limit of {}s reached", limit);
                break;
            }
        }

        // Start detection once the one-shot model load settles.
        if session.state() == lookout::SessionState::Open {
            match model_state(&model) {
                ModelState::Ready => session.start_detection()?,
                ModelState::Failed(reason) => {
                    if !load_failure_reported {
                        log::error!("detection disabled for this run: {}", reason);
                        load_failure_reported = true;
                    }
                }
                ModelState::Loading => {}
            }
        }

        // Presentation drain: last value wins on every channel.
        if let Some(status) = sink.take_status() {
            log::info!("status: {}", status);
        }
        if let Some(frame) = sink.take_raw() {
            raw_frames_seen += 1;
            log::debug!("raw frame {} ({}x{})", frame.seq, frame.width, frame.height);
        }
        if let Some(update) = sink.take_inference() {
            results_seen += 1;
            log::info!(
                "result (frame {}): {}",
                update.annotated.seq,
                update.summary.replace('\n', " | ")
            );
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            log::info!(
                "health: state={:?} raw_updates={} results={}",
                session.state(),
                raw_frames_seen,
                results_seen
            );
            last_health_log = Instant::now();
        }

        std::thread::sleep(PRESENTATION_INTERVAL);
    }

    log::info!("shutting down");
    session.close_device();
    slot.shutdown();
    worker.join();
    Ok(())
}

fn build_detector(cfg: &LookoutConfig) -> Result<Box<dyn lookout::Detector>> {
    match cfg.detector.backend.as_str() {
        "stub" => Ok(Box::new(StubDetector::new())),
        "tract" => {
            #[cfg(feature = "backend-tract")]
            {
                let model_path = cfg
                    .detector
                    .model_path
                    .as_ref()
                    .ok_or_else(|| anyhow!("tract backend requires detector.model_path"))?;
                Ok(Box::new(
                    lookout::TractDetector::new(
                        model_path,
                        cfg.capture.width,
                        cfg.capture.height,
                    )
                    .with_threshold(cfg.detector.confidence_threshold),
                ))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                Err(anyhow!(
                    "tract backend requires building with the backend-tract feature"
                ))
            }
        }
        other => Err(anyhow!("unknown detector backend '{}'", other)),
    }
}
