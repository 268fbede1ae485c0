//! Frame annotation.
//!
//! Draws a highlight border onto a copy of the source frame when anything was
//! detected. Stands in for the model library's own plot/overlay routine when a
//! backend has none.

use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

const BORDER_THICKNESS: u32 = 4;
const HIGHLIGHT_RGB: [u8; 3] = [220, 40, 40];

/// Copy the frame and draw a border when the detection set is non-empty.
/// An empty set returns an unmarked copy sharing the original buffer.
pub fn annotate(frame: &Frame, detections: &[Detection]) -> Result<Frame> {
    if detections.is_empty() {
        return Ok(frame.clone());
    }

    let mut pixels = frame.data().to_vec();
    let width = frame.width;
    let height = frame.height;
    let channels = frame.channels as u32;
    let thickness = BORDER_THICKNESS.min(width / 2).min(height / 2);

    for y in 0..height {
        for x in 0..width {
            let on_border = x < thickness
                || y < thickness
                || x >= width - thickness
                || y >= height - thickness;
            if !on_border {
                continue;
            }
            let offset = ((y * width + x) * channels) as usize;
            for (i, &value) in HIGHLIGHT_RGB.iter().enumerate().take(channels as usize) {
                pixels[offset + i] = value;
            }
        }
    }

    frame.with_data(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![0u8; 32 * 32 * 3], 32, 32, 3, 1).unwrap()
    }

    #[test]
    fn empty_detections_leave_the_frame_unmarked() {
        let source = frame();
        let annotated = annotate(&source, &[]).unwrap();
        assert!(source.shares_buffer(&annotated));
    }

    #[test]
    fn detections_draw_a_border_on_a_copy() {
        let source = frame();
        let annotated = annotate(&source, &[Detection::new("motion", 0.85)]).unwrap();

        assert!(!source.shares_buffer(&annotated));
        // Top-left corner painted, center untouched.
        assert_eq!(&annotated.data()[0..3], &HIGHLIGHT_RGB);
        let center = ((16 * 32 + 16) * 3) as usize;
        assert_eq!(&annotated.data()[center..center + 3], &[0, 0, 0]);
        // Source frame is untouched.
        assert_eq!(&source.data()[0..3], &[0, 0, 0]);
    }
}
