//! Captured frames.
//!
//! A `Frame` is an immutable pixel buffer plus capture metadata. Frames are
//! created by the capture layer, cloned cheaply (the buffer is shared) into
//! the raw presentation view and the inference slot, and never mutated after
//! creation. Annotation produces a new frame with the same metadata.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{anyhow, Result};

/// One captured image buffer with metadata.
#[derive(Clone)]
pub struct Frame {
    /// Shared pixel data, tightly packed, `width * height * channels` bytes.
    data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Capture ordinal assigned by the source, 1-based.
    pub seq: u64,
    pub captured_at: SystemTime,
}

impl Frame {
    /// Create a frame, validating that the buffer matches its dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, seq: u64) -> Result<Self> {
        let expected = expected_len(width, height, channels)?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer length mismatch: expected {} bytes for {}x{}x{}, got {}",
                expected,
                width,
                height,
                channels,
                data.len()
            ));
        }
        Ok(Self {
            data: data.into(),
            width,
            height,
            channels,
            seq,
            captured_at: SystemTime::now(),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// New frame with the same metadata but a replacement pixel buffer.
    /// Used by annotation, which draws on a copy.
    pub fn with_data(&self, data: Vec<u8>) -> Result<Self> {
        if data.len() != self.data.len() {
            return Err(anyhow!(
                "replacement buffer length mismatch: expected {}, got {}",
                self.data.len(),
                data.len()
            ));
        }
        Ok(Self {
            data: data.into(),
            ..self.clone()
        })
    }

    /// Whether two frames share the same underlying pixel buffer.
    pub fn shares_buffer(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("seq", &self.seq)
            .field("bytes", &self.data.len())
            .finish()
    }
}

pub(crate) fn expected_len(width: u32, height: u32, channels: u8) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels as usize))
        .filter(|&v| v > 0)
        .ok_or_else(|| anyhow!("invalid frame dimensions {}x{}x{}", width, height, channels))
}
