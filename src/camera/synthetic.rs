use super::source::FrameSource;
use crate::config::CameraConfig;
use crate::error::Result;
use crate::frame::FrameData;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::time::SystemTime;
use tracing::trace;

const BACKGROUND: Rgb<u8> = Rgb([32, 40, 48]);
const TARGET: Rgb<u8> = Rgb([230, 220, 200]);

/// Camera stand-in that renders a bright square drifting across a dark
/// background. Useful for running the whole pipeline without hardware.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    frame_counter: u64,
    square: u32,
}

impl SyntheticFrameSource {
    pub fn new(config: &CameraConfig) -> Self {
        let (width, height) = config.resolution;
        Self {
            width: width.max(1),
            height: height.max(1),
            frame_counter: 0,
            square: (width.min(height) / 6).max(4),
        }
    }

    /// Top-left corner of the square for a given frame
    pub fn square_position(&self, frame_id: u64) -> (u32, u32) {
        let travel_x = self.width.saturating_sub(self.square).max(1) as u64;
        let travel_y = self.height.saturating_sub(self.square).max(1) as u64;
        (
            bounce(frame_id * 3, travel_x) as u32,
            bounce(frame_id * 2, travel_y) as u32,
        )
    }

    #[cfg(test)]
    pub fn square_size(&self) -> u32 {
        self.square
    }

    pub fn render(&self, frame_id: u64) -> RgbImage {
        let mut image = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let (x, y) = self.square_position(frame_id);
        draw_filled_rect_mut(
            &mut image,
            Rect::at(x as i32, y as i32).of_size(self.square, self.square),
            TARGET,
        );
        image
    }
}

/// Triangle wave over [0, travel]
fn bounce(position: u64, travel: u64) -> u64 {
    let phase = position % (2 * travel);
    if phase <= travel {
        phase
    } else {
        2 * travel - phase
    }
}

impl FrameSource for SyntheticFrameSource {
    fn capture(&mut self) -> Result<FrameData> {
        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        let image = self.render(frame_id);
        trace!("Generated synthetic frame {}", frame_id);
        Ok(FrameData::from_rgb_image(frame_id, SystemTime::now(), image))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
