use crate::error::{CameraError, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Motion JPEG format - compressed JPEG frames
    Mjpeg,
    /// RGB24 format - uncompressed, row-major, 3 bytes per pixel
    Rgb24,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Mjpeg => 0, // Variable size, compressed
            FrameFormat::Rgb24 => 3,
        }
    }

    /// Check if format is compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, FrameFormat::Mjpeg)
    }
}

/// Frame data structure containing raw frame data and metadata
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Unique frame identifier
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// Raw frame data (shared ownership for efficiency)
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame format
    pub format: FrameFormat,
}

impl FrameData {
    /// Create a new frame data instance
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Wrap an already decoded RGB image
    pub fn from_rgb_image(id: u64, timestamp: SystemTime, image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(id, timestamp, image.into_raw(), width, height, FrameFormat::Rgb24)
    }

    /// Get the expected frame size for uncompressed formats
    pub fn expected_size(&self) -> Option<usize> {
        if self.format.is_compressed() {
            None
        } else {
            Some(self.width as usize * self.height as usize * self.format.bytes_per_pixel())
        }
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        match self.expected_size() {
            Some(expected) => self.data.len() == expected,
            None => true,
        }
    }

    /// Total pixel count of the frame
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Decode the frame into an owned RGB image
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        match self.format {
            FrameFormat::Rgb24 => {
                RgbImage::from_raw(self.width, self.height, self.data.to_vec()).ok_or_else(|| {
                    CameraError::Decode {
                        details: format!(
                            "frame {} has {} bytes, expected {:?}",
                            self.id,
                            self.data.len(),
                            self.expected_size()
                        ),
                    }
                    .into()
                })
            }
            FrameFormat::Mjpeg => image::load_from_memory(&self.data)
                .map(|img| img.to_rgb8())
                .map_err(|e| {
                    CameraError::Decode {
                        details: format!("MJPEG decode failed for frame {}: {}", self.id, e),
                    }
                    .into()
                }),
        }
    }
}

/// Map a pixel position to the normalized target frame.
///
/// The frame center is (0, 0); the left/top edges are -1 and the
/// right/bottom edges are +1. Results are clamped to [-1, 1].
pub fn normalize_point(x: f64, y: f64, width: u32, height: u32) -> (f64, f64) {
    let half_w = (width as f64 / 2.0).max(f64::EPSILON);
    let half_h = (height as f64 / 2.0).max(f64::EPSILON);
    (
        ((x - half_w) / half_w).clamp(-1.0, 1.0),
        ((y - half_h) / half_h).clamp(-1.0, 1.0),
    )
}

/// Inverse of [`normalize_point`], used when drawing the tracked position
pub fn denormalize_point(nx: f64, ny: f64, width: u32, height: u32) -> (f64, f64) {
    let half_w = width as f64 / 2.0;
    let half_h = height as f64 / 2.0;
    (half_w + nx * half_w, half_h + ny * half_h)
}
