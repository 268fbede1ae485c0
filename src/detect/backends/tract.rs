#![cfg(feature = "backend-tract")]

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::annotate::annotate;
use crate::detect::backend::Detector;
use crate::detect::result::{Detection, Inference};
use crate::frame::Frame;

/// Tract-based detector for ONNX classification models.
///
/// The model file is loaded lazily in `load`, on the inference worker thread,
/// so a missing or corrupt model surfaces through the one-shot load phase
/// rather than at construction. No network I/O; the only disk access is the
/// model read.
pub struct TractDetector {
    model_path: PathBuf,
    width: u32,
    height: u32,
    confidence_threshold: f32,
    model: Option<SimplePlan<TypedFact, Box<dyn TypedOp>>>,
}

impl TractDetector {
    pub fn new(model_path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            model_path: model_path.into(),
            width,
            height,
            confidence_threshold: 0.5,
            model: None,
        }
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        if frame.width != self.width || frame.height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                frame.width,
                frame.height,
                self.width,
                self.height
            ));
        }
        if frame.channels != 3 {
            return Err(anyhow!(
                "model expects RGB input, frame has {} channels",
                frame.channels
            ));
        }

        let pixels = frame.data();
        let width = self.width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_confidence(&self, outputs: TVec<TValue>) -> Result<f32> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let max_score = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        if max_score.is_finite() {
            Ok(max_score)
        } else {
            Ok(0.0)
        }
    }
}

impl Detector for TractDetector {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn load(&mut self) -> Result<()> {
        let model = tract_onnx::onnx()
            .model_for_path(&self.model_path)
            .with_context(|| {
                format!(
                    "failed to load ONNX model from {}",
                    self.model_path.display()
                )
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, self.height as usize, self.width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        self.model = Some(model);
        log::info!(
            "TractDetector: loaded {} ({}x{} input)",
            self.model_path.display(),
            self.width,
            self.height
        );
        Ok(())
    }

    fn infer(&mut self, frame: &Frame) -> Result<Inference> {
        let model = self.model.as_ref().context("model not loaded")?;

        let input = self.build_input(frame)?;
        let outputs = model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let confidence = self.extract_confidence(outputs)?;

        let detections = if confidence >= self.confidence_threshold {
            vec![Detection::new("object", confidence)]
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
