use super::detector::Detector;
use super::types::{BoundingBox, Detection, TargetClass};
use crate::config::DetectionConfig;
use crate::error::DetectorError;
use crate::frame::FrameData;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{
    contrast::threshold,
    distance_transform::Norm,
    filter::gaussian_blur_f32,
    morphology::{dilate, erode},
    region_labelling::{connected_components, Connectivity},
};
use std::collections::HashMap;
use tracing::{debug, info};

const BACKGROUND_LEARNING_RATE: f32 = 0.05;
/// Blobs larger than this share of the frame mean the camera itself moved
const GLOBAL_MOTION_FRACTION: f32 = 0.5;

/// Model-free body detector: background subtraction plus connected
/// components. The largest moving blob is reported as a body box whose
/// confidence grows with the blob's share of the frame.
pub struct MotionDetector {
    delta_threshold: u8,
    full_confidence_fraction: f32,
    downscale: u32,
    background_model: Option<GrayImage>,
}

/// Pixel extent and size of one labelled component
#[derive(Debug, Clone, Copy)]
struct Blob {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixels: u32,
}

impl MotionDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        info!(
            "Initializing motion body detector (delta {}, downscale 1/{})",
            config.motion_delta_threshold, config.motion_downscale
        );

        Self {
            delta_threshold: config.motion_delta_threshold,
            full_confidence_fraction: config.motion_full_confidence_fraction,
            downscale: config.motion_downscale.max(1),
            background_model: None,
        }
    }

    #[cfg(test)]
    pub fn background_initialized(&self) -> bool {
        self.background_model.is_some()
    }

    fn preprocess(&self, frame: &FrameData) -> Result<GrayImage, DetectorError> {
        let rgb = frame.to_rgb_image().map_err(|e| DetectorError::Frame {
            detector: self.name().to_string(),
            details: e.to_string(),
        })?;

        let gray = imageops::grayscale(&rgb);
        let gray = if self.downscale > 1 {
            let width = (frame.width / self.downscale).max(1);
            let height = (frame.height / self.downscale).max(1);
            imageops::resize(&gray, width, height, FilterType::Triangle)
        } else {
            gray
        };

        Ok(gaussian_blur_f32(&gray, 2.0))
    }

    fn frame_difference(background: &GrayImage, current: &GrayImage) -> GrayImage {
        let (width, height) = background.dimensions();
        let mut diff_image = GrayImage::new(width, height);

        for (x, y, bg_pixel) in background.enumerate_pixels() {
            if let Some(curr_pixel) = current.get_pixel_checked(x, y) {
                let diff = (bg_pixel[0] as i16 - curr_pixel[0] as i16).unsigned_abs() as u8;
                diff_image.put_pixel(x, y, Luma([diff]));
            }
        }

        diff_image
    }

    fn largest_blob(components: &ImageBuffer<Luma<u32>, Vec<u32>>) -> Option<Blob> {
        let mut blobs: HashMap<u32, Blob> = HashMap::new();

        for (x, y, pixel) in components.enumerate_pixels() {
            let label = pixel[0];
            if label == 0 {
                continue;
            }
            blobs
                .entry(label)
                .and_modify(|b| {
                    b.min_x = b.min_x.min(x);
                    b.min_y = b.min_y.min(y);
                    b.max_x = b.max_x.max(x);
                    b.max_y = b.max_y.max(y);
                    b.pixels += 1;
                })
                .or_insert(Blob {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                    pixels: 1,
                });
        }

        blobs.into_values().max_by_key(|b| b.pixels)
    }

    fn update_background_model(&mut self, current_frame: &GrayImage) {
        if let Some(ref mut background) = self.background_model {
            for (bg_pixel, curr_pixel) in background.pixels_mut().zip(current_frame.pixels()) {
                let bg_val = bg_pixel[0] as f32;
                let curr_val = curr_pixel[0] as f32;
                bg_pixel[0] = (bg_val * (1.0 - BACKGROUND_LEARNING_RATE)
                    + curr_val * BACKGROUND_LEARNING_RATE) as u8;
            }
        }
    }
}

impl Detector for MotionDetector {
    fn class(&self) -> TargetClass {
        TargetClass::Body
    }

    fn name(&self) -> &str {
        "motion"
    }

    fn infer(&mut self, frame: &FrameData) -> Result<Vec<Detection>, DetectorError> {
        let blurred = self.preprocess(frame)?;

        let diff_image = self
            .background_model
            .as_ref()
            .filter(|background| background.dimensions() == blurred.dimensions())
            .map(|background| Self::frame_difference(background, &blurred));

        let Some(diff_image) = diff_image else {
            debug!("Initializing motion background with frame {}", frame.id);
            self.background_model = Some(blurred);
            return Ok(Vec::new());
        };

        let binary_mask = threshold(&diff_image, self.delta_threshold);
        let cleaned_mask = dilate(&erode(&binary_mask, Norm::LInf, 1), Norm::LInf, 2);
        let components = connected_components(&cleaned_mask, Connectivity::Eight, Luma([0u8]));

        self.update_background_model(&blurred);

        let Some(blob) = Self::largest_blob(&components) else {
            return Ok(Vec::new());
        };

        let (small_w, small_h) = cleaned_mask.dimensions();
        let coverage = blob.pixels as f32 / (small_w as f32 * small_h as f32);
        if coverage > GLOBAL_MOTION_FRACTION {
            debug!(
                "Frame {}: {:.0}% of the frame changed, rebuilding background",
                frame.id,
                coverage * 100.0
            );
            self.background_model = Some(blurred);
            return Ok(Vec::new());
        }
        let confidence = (coverage / self.full_confidence_fraction).min(1.0);

        let scale = self.downscale as f32;
        let bbox = BoundingBox::from_corners(
            blob.min_x as f32 * scale,
            blob.min_y as f32 * scale,
            (blob.max_x + 1) as f32 * scale,
            (blob.max_y + 1) as f32 * scale,
        );

        debug!(
            "Motion blob in frame {}: {} px ({:.1}% of frame), confidence {:.2}",
            frame.id,
            blob.pixels,
            coverage * 100.0,
            confidence
        );

        Ok(vec![Detection::new(bbox, confidence, TargetClass::Body)])
    }
}
