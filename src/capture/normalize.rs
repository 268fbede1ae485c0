//! Canonical-resolution normalization.
//!
//! Devices capture at their native resolution; everything downstream works on
//! one canonical size. Nearest-neighbor is enough here: the output feeds a
//! live preview and a detector, not an archival pipeline.

use anyhow::{anyhow, Result};

use crate::frame::{expected_len, Frame};

/// Resize a frame to the canonical resolution.
///
/// A frame already at the target size is passed through unchanged (the
/// shared buffer is reused, no copy).
pub(crate) fn fit(frame: Frame, width: u32, height: u32) -> Result<Frame> {
    if frame.width == width && frame.height == height {
        return Ok(frame);
    }
    if frame.width == 0 || frame.height == 0 {
        return Err(anyhow!(
            "cannot resize degenerate frame {}x{}",
            frame.width,
            frame.height
        ));
    }

    let channels = frame.channels as usize;
    let out_len = expected_len(width, height, frame.channels)?;
    let src = frame.data();
    let mut out = vec![0u8; out_len];

    for y in 0..height as usize {
        let src_y = y * frame.height as usize / height as usize;
        for x in 0..width as usize {
            let src_x = x * frame.width as usize / width as usize;
            let src_offset = (src_y * frame.width as usize + src_x) * channels;
            let dst_offset = (y * width as usize + x) * channels;
            out[dst_offset..dst_offset + channels]
                .copy_from_slice(&src[src_offset..src_offset + channels]);
        }
    }

    let mut resized = Frame::new(out, width, height, frame.channels, frame.seq)?;
    resized.captured_at = frame.captured_at;
    Ok(resized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_size_passes_through_without_copy() {
        let frame = Frame::new(vec![1u8; 8 * 8 * 3], 8, 8, 3, 1).unwrap();
        let original = frame.clone();
        let fitted = fit(frame, 8, 8).unwrap();
        assert!(fitted.shares_buffer(&original));
    }

    #[test]
    fn downscale_keeps_metadata_and_content() {
        let mut pixels = vec![0u8; 4 * 4 * 3];
        // Right half white, left half black.
        for y in 0..4 {
            for x in 2..4 {
                let offset = (y * 4 + x) * 3;
                pixels[offset..offset + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let frame = Frame::new(pixels, 4, 4, 3, 5).unwrap();
        let captured_at = frame.captured_at;

        let fitted = fit(frame, 2, 2).unwrap();
        assert_eq!(fitted.width, 2);
        assert_eq!(fitted.height, 2);
        assert_eq!(fitted.seq, 5);
        assert_eq!(fitted.captured_at, captured_at);
        // Left column black, right column white.
        assert_eq!(&fitted.data()[0..3], &[0, 0, 0]);
        assert_eq!(&fitted.data()[3..6], &[255, 255, 255]);
    }

    #[test]
    fn upscale_replicates_pixels() {
        let frame = Frame::new(vec![9u8; 2 * 2 * 3], 2, 2, 3, 1).unwrap();
        let fitted = fit(frame, 4, 4).unwrap();
        assert_eq!(fitted.byte_len(), 4 * 4 * 3);
        assert!(fitted.data().iter().all(|&b| b == 9));
    }
}
