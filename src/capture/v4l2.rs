#![cfg(feature = "capture-v4l2")]

//! V4L2 capture device.
//!
//! Opens a local device node (e.g. /dev/video0), negotiates an RGB format at
//! the requested size, and captures through a memory-mapped buffer stream.
//! The device may refuse the requested format or size; whatever it actually
//! delivers is reported per frame and normalized downstream.

use anyhow::Context;
use ouroboros::self_referencing;

use crate::capture::source::CaptureSettings;
use crate::capture::CaptureDevice;
use crate::error::PipelineError;
use crate::frame::Frame;

pub struct V4l2Device {
    settings: CaptureSettings,
    state: Option<V4l2State>,
    frame_count: u64,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Device {
    /// Open and configure the device node named by the settings.
    pub fn open(settings: CaptureSettings) -> Result<Self, PipelineError> {
        Self::open_inner(&settings)
            .map_err(|err| PipelineError::DeviceUnavailable {
                device: settings.device.clone(),
                reason: format!("{:#}", err),
            })
            .map(|(state, active_width, active_height)| Self {
                settings,
                state: Some(state),
                frame_count: 0,
                active_width,
                active_height,
            })
    }

    fn open_inner(settings: &CaptureSettings) -> anyhow::Result<(V4l2State, u32, u32)> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&settings.device)
            .with_context(|| format!("open v4l2 device {}", settings.device))?;

        let mut format = device.format().context("read v4l2 format")?;
        format.width = settings.width;
        format.height = settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Device: failed to set format on {}: {}",
                    settings.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        let (active_width, active_height) = (format.width, format.height);

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "V4l2Device: opened {} ({}x{})",
            settings.device,
            active_width,
            active_height
        );
        Ok((state, active_width, active_height))
    }
}

impl CaptureDevice for V4l2Device {
    fn describe(&self) -> String {
        format!(
            "{} ({}x{})",
            self.settings.device, self.active_width, self.active_height
        )
    }

    fn read(&mut self) -> Result<Frame, PipelineError> {
        use v4l::io::traits::CaptureStream;

        let state = self
            .state
            .as_mut()
            .ok_or_else(|| PipelineError::ReadFailed("v4l2 device released".to_string()))?;

        let (buf, _meta) = state
            .with_stream_mut(|stream| stream.next())
            .map_err(|err| PipelineError::ReadFailed(format!("capture v4l2 frame: {}", err)))?;

        self.frame_count += 1;
        Frame::new(
            buf.to_vec(),
            self.active_width,
            self.active_height,
            3,
            self.frame_count,
        )
        .map_err(|err| PipelineError::ReadFailed(err.to_string()))
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!(
                "V4l2Device: released {} after {} frames",
                self.settings.device,
                self.frame_count
            );
        }
    }
}
