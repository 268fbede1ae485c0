//! Detection results and their textual summary.

use crate::frame::Frame;

/// One labeled, confidence-scored object found by inference.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Output of one inference cycle: the annotated frame and what was found.
#[derive(Debug)]
pub struct Inference {
    pub annotated: Frame,
    pub detections: Vec<Detection>,
}

/// Maximum number of entries listed in a detection summary.
pub const SUMMARY_LIMIT: usize = 5;

/// Summarize a detection set for the result panel.
///
/// Entries are listed by descending confidence, capped at [`SUMMARY_LIMIT`];
/// a truncated summary ends with a count of the remainder.
pub fn summarize(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return "no objects detected".to_string();
    }

    let mut ordered: Vec<&Detection> = detections.iter().collect();
    ordered.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let noun = if detections.len() == 1 {
        "object"
    } else {
        "objects"
    };
    let mut summary = format!("detected {} {}:", detections.len(), noun);
    for detection in ordered.iter().take(SUMMARY_LIMIT) {
        summary.push_str(&format!("\n{}: {:.2}", detection.label, detection.confidence));
    }
    if ordered.len() > SUMMARY_LIMIT {
        summary.push_str(&format!("\n... {} more", ordered.len() - SUMMARY_LIMIT));
    }
    summary
}
