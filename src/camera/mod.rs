mod source;
mod synthetic;

#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst;


pub use source::{open_frame_source, FrameSource};
pub use synthetic::SyntheticFrameSource;

#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst::GstFrameSource;
