use crate::config::CameraConfig;
use crate::error::Result;
use crate::frame::FrameData;
use tracing::info;

/// Something that hands out one frame per control cycle.
///
/// `capture` blocks until a frame is ready or fails; a failure is a
/// transient, per-cycle condition and the caller decides when it becomes
/// fatal.
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<FrameData>;

    /// Frame size this source was configured for
    fn resolution(&self) -> (u32, u32);

    /// Stop the underlying device. Called once at shutdown.
    fn close(&mut self) {}
}

/// Open the configured frame source
pub fn open_frame_source(config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    if config.synthetic {
        info!("Using synthetic test pattern camera");
        return Ok(Box::new(super::SyntheticFrameSource::new(config)));
    }

    #[cfg(all(feature = "camera", target_os = "linux"))]
    {
        Ok(Box::new(super::GstFrameSource::open(config)?))
    }

    #[cfg(not(all(feature = "camera", target_os = "linux")))]
    {
        tracing::warn!("Built without camera support; falling back to synthetic test pattern");
        Ok(Box::new(super::SyntheticFrameSource::new(config)))
    }
}
