use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureSettings;

const DEFAULT_DEVICE: &str = "stub://cam0";
const DEFAULT_TICK_INTERVAL_MS: u64 = 50;
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_CYCLE_DELAY_MS: u64 = 100;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Deserialize, Default)]
struct LookoutConfigFile {
    device: Option<String>,
    capture: Option<CaptureConfigFile>,
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    tick_interval_ms: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    cycle_delay_ms: Option<u64>,
    confidence_threshold: Option<f32>,
}

/// Daemon configuration: defaults, then TOML file, then `LOOKOUT_*` env
/// overrides.
#[derive(Clone, Debug)]
pub struct LookoutConfig {
    pub capture: CaptureSettings,
    pub detector: DetectorSettings,
}

#[derive(Clone, Debug)]
pub struct DetectorSettings {
    /// Backend name: "stub" or "tract".
    pub backend: String,
    /// ONNX model file, required by the tract backend.
    pub model_path: Option<PathBuf>,
    /// Fixed delay after each inference cycle.
    pub cycle_delay: Duration,
    pub confidence_threshold: f32,
}

impl LookoutConfig {
    /// Load from the file named by `LOOKOUT_CONFIG` (if set), then apply env
    /// overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LOOKOUT_CONFIG").ok().map(PathBuf::from);
        Self::load_with_path(config_path.as_deref())
    }

    /// Same as [`load`](Self::load) with an explicit config file path, which
    /// takes precedence over `LOOKOUT_CONFIG`.
    pub fn load_with_path(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("LOOKOUT_CONFIG").ok().map(PathBuf::from);
        let path = path.or(env_path.as_deref());
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: LookoutConfigFile) -> Self {
        let capture = CaptureSettings {
            device: file.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            width: file
                .capture
                .as_ref()
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_WIDTH),
            height: file
                .capture
                .as_ref()
                .and_then(|c| c.height)
                .unwrap_or(DEFAULT_HEIGHT),
            tick_interval: Duration::from_millis(
                file.capture
                    .as_ref()
                    .and_then(|c| c.tick_interval_ms)
                    .unwrap_or(DEFAULT_TICK_INTERVAL_MS),
            ),
        };
        let detector = DetectorSettings {
            backend: file
                .detector
                .as_ref()
                .and_then(|d| d.backend.clone())
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: file.detector.as_ref().and_then(|d| d.model_path.clone()),
            cycle_delay: Duration::from_millis(
                file.detector
                    .as_ref()
                    .and_then(|d| d.cycle_delay_ms)
                    .unwrap_or(DEFAULT_CYCLE_DELAY_MS),
            ),
            confidence_threshold: file
                .detector
                .as_ref()
                .and_then(|d| d.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
        };
        Self { capture, detector }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("LOOKOUT_DEVICE") {
            self.capture.device = device;
        }
        if let Some(ms) = env_u64("LOOKOUT_TICK_MS")? {
            self.capture.tick_interval = Duration::from_millis(ms);
        }
        if let Ok(backend) = std::env::var("LOOKOUT_BACKEND") {
            self.detector.backend = backend;
        }
        if let Ok(path) = std::env::var("LOOKOUT_MODEL_PATH") {
            self.detector.model_path = Some(PathBuf::from(path));
        }
        if let Some(ms) = env_u64("LOOKOUT_CYCLE_DELAY_MS")? {
            self.detector.cycle_delay = Duration::from_millis(ms);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(anyhow!(
                "capture resolution must be non-zero, got {}x{}",
                self.capture.width,
                self.capture.height
            ));
        }
        if self.capture.tick_interval.is_zero() {
            return Err(anyhow!("capture tick interval must be non-zero"));
        }
        match self.detector.backend.as_str() {
            "stub" => {}
            "tract" => {
                if self.detector.model_path.is_none() {
                    return Err(anyhow!("tract backend requires detector.model_path"));
                }
            }
            other => return Err(anyhow!("unknown detector backend '{}'", other)),
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(anyhow!(
                "confidence threshold must be in [0, 1], got {}",
                self.detector.confidence_threshold
            ));
        }
        Ok(())
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => {
            let parsed = value
                .parse::<u64>()
                .with_context(|| format!("{} must be an integer, got '{}'", key, value))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<LookoutConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}
