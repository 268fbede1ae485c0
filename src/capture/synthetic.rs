use rand::Rng;

use crate::capture::source::CaptureSettings;
use crate::capture::CaptureDevice;
use crate::error::PipelineError;
use crate::frame::Frame;

/// Synthetic capture device for development and tests.
///
/// Generates a moving gradient with per-frame speckle noise, so downstream
/// motion detection sees changing content. The scene shifts every
/// `SCENE_SHIFT_FRAMES` frames to simulate an object entering.
pub struct SyntheticDevice {
    settings: CaptureSettings,
    frame_count: u64,
    scene_state: u8,
    released: bool,
}

const SCENE_SHIFT_FRAMES: u64 = 50;
const SPECKLES_PER_FRAME: usize = 32;

impl SyntheticDevice {
    pub fn new(settings: CaptureSettings) -> Self {
        log::info!("SyntheticDevice: opened {} (synthetic)", settings.device);
        Self {
            settings,
            frame_count: 0,
            scene_state: 0,
            released: false,
        }
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.settings.width * self.settings.height * 3) as usize;

        if self.frame_count % SCENE_SHIFT_FRAMES == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        // Moving gradient: mixes position, frame count, and scene state.
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }

        // Sensor-noise speckles so no two frames hash identically.
        let mut rng = rand::thread_rng();
        for _ in 0..SPECKLES_PER_FRAME.min(pixel_count) {
            let idx = rng.gen_range(0..pixel_count);
            pixels[idx] = rng.gen();
        }

        pixels
    }
}

impl CaptureDevice for SyntheticDevice {
    fn describe(&self) -> String {
        format!("{} (synthetic)", self.settings.device)
    }

    fn read(&mut self) -> Result<Frame, PipelineError> {
        if self.released {
            return Err(PipelineError::ReadFailed(
                "synthetic device already released".to_string(),
            ));
        }

        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Frame::new(
            pixels,
            self.settings.width,
            self.settings.height,
            3,
            self.frame_count,
        )
        .map_err(|err| PipelineError::ReadFailed(err.to_string()))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        log::info!(
            "SyntheticDevice: released {} after {} frames",
            self.settings.device,
            self.frame_count
        );
    }
}
