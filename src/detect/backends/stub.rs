use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::annotate::annotate;
use crate::detect::backend::Detector;
use crate::detect::result::{Detection, Inference};
use crate::frame::Frame;

/// Stub detector for development and tests. Uses pixel hashing to detect
/// motion between consecutive frames; no model file required.
pub struct StubDetector {
    last_hash: Option<[u8; 32]>,
}

impl StubDetector {
    pub fn new() -> Self {
        Self { last_hash: None }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn load(&mut self) -> Result<()> {
        // Nothing to load; the stub is always ready.
        log::info!("StubDetector: ready (frame-hash motion detection)");
        Ok(())
    }

    fn infer(&mut self, frame: &Frame) -> Result<Inference> {
        let current_hash: [u8; 32] = Sha256::digest(frame.data()).into();

        let motion = match self.last_hash {
            Some(prev) => prev != current_hash,
            None => false,
        };
        self.last_hash = Some(current_hash);

        let detections = if motion {
            vec![Detection::new("motion", 0.85)]
        } else {
            Vec::new()
        };

        let annotated = annotate(frame, &detections)?;
        Ok(Inference {
            annotated,
            detections,
        })
    }
}
