use super::source::FrameSource;
use crate::config::CameraConfig;
use crate::error::{CameraError, Result};
use crate::frame::{FrameData, FrameFormat};
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::time::SystemTime;
use tracing::{debug, info, trace, warn};

/// V4L2 camera read through a GStreamer pipeline that converts to RGB.
///
/// The appsink keeps a single buffer and drops older ones, so every capture
/// returns the freshest frame rather than a backlog.
pub struct GstFrameSource {
    pipeline: Pipeline,
    appsink: AppSink,
    config: CameraConfig,
    frame_counter: u64,
    pull_timeout_ms: u64,
}

impl GstFrameSource {
    pub fn open(config: &CameraConfig) -> Result<Self> {
        info!(
            "Opening camera /dev/video{} ({}x{} @ {}fps)",
            config.device, config.resolution.0, config.resolution.1, config.fps
        );

        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        let description = build_pipeline_string(config);
        debug!("Creating GStreamer pipeline: {}", description);

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::Configuration {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::Configuration {
                details: "Pipeline has no appsink".to_string(),
            })?
            .downcast::<AppSink>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to AppSink".to_string(),
            })?;

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CameraError::DeviceOpen {
                device: config.device,
                details: e.to_string(),
            })?;

        // Allow a few frame periods before calling a pull a failure
        let pull_timeout_ms = (3000 / config.fps.max(1) as u64).max(200);

        Ok(Self {
            pipeline,
            appsink,
            config: config.clone(),
            frame_counter: 0,
            pull_timeout_ms,
        })
    }

    fn sample_to_frame(&mut self, sample: gstreamer::Sample) -> Result<FrameData> {
        let buffer = sample.buffer().ok_or_else(|| CameraError::NoFrame {
            details: "No buffer in sample".to_string(),
        })?;
        let caps = sample.caps().ok_or_else(|| CameraError::NoFrame {
            details: "No caps in sample".to_string(),
        })?;
        let info = VideoInfo::from_caps(caps).map_err(|e| CameraError::Decode {
            details: format!("Failed to get video info: {}", e),
        })?;
        let map = buffer.map_readable().map_err(|e| CameraError::Decode {
            details: format!("Failed to map buffer: {}", e),
        })?;

        let width = info.width();
        let height = info.height();
        let row_bytes = width as usize * 3;
        let stride = info.stride()[0] as usize;
        let source = map.as_slice();

        // Rows may be padded; repack them tightly
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let end = start + row_bytes;
            let slice = source.get(start..end).ok_or_else(|| CameraError::Decode {
                details: format!("Buffer too short for row {} of {}", row, height),
            })?;
            data.extend_from_slice(slice);
        }

        let frame_id = self.frame_counter;
        self.frame_counter += 1;
        trace!("Captured frame {} ({}x{})", frame_id, width, height);

        Ok(FrameData::new(
            frame_id,
            SystemTime::now(),
            data,
            width,
            height,
            FrameFormat::Rgb24,
        ))
    }
}

/// v4l2 -> RGB appsink, scaled to the configured resolution
fn build_pipeline_string(config: &CameraConfig) -> String {
    let (width, height) = config.resolution;
    format!(
        "v4l2src device=/dev/video{} io-mode=mmap ! \
         videoconvert ! videoscale ! \
         video/x-raw,format=RGB,width={},height={} ! \
         appsink name=sink sync=false max-buffers=1 drop=true enable-last-sample=false",
        config.device, width, height
    )
}

impl FrameSource for GstFrameSource {
    fn capture(&mut self) -> Result<FrameData> {
        let timeout = gstreamer::ClockTime::from_mseconds(self.pull_timeout_ms);
        match self.appsink.try_pull_sample(timeout) {
            Some(sample) => self.sample_to_frame(sample),
            None if self.appsink.is_eos() => Err(CameraError::NoFrame {
                details: "Camera stream ended".to_string(),
            }
            .into()),
            None => Err(CameraError::NoFrame {
                details: format!("No frame within {}ms", self.pull_timeout_ms),
            }
            .into()),
        }
    }

    fn resolution(&self) -> (u32, u32) {
        self.config.resolution
    }

    fn close(&mut self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to stop camera pipeline: {}", e);
        } else {
            info!("Camera pipeline stopped");
        }
    }
}

impl Drop for GstFrameSource {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}
