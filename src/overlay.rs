use crate::config::StreamConfig;
use crate::detection::{BoundingBox, DetectorUsed};
use crate::error::{Result, StreamError};
use crate::frame::denormalize_point;
use crate::tracking::TrackerMode;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, Rgb, RgbImage};
use imageproc::drawing::{
    draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use tracing::{debug, warn};

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CROSSHAIR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TRAIL_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const FPS_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const CONF_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const POS_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const DETECTOR_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const STATUS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const CROSSHAIR_ARM: f32 = 20.0;
const CROSSHAIR_GAP: f32 = 5.0;
const CROSSHAIR_RADIUS: i32 = 8;

/// What to draw on one published frame
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayInfo {
    pub mode: TrackerMode,
    pub fps: f64,
    /// Fused detection of this cycle
    pub detection_box: Option<BoundingBox>,
    pub confidence: Option<f32>,
    pub detector_used: DetectorUsed,
    /// Last known normalized target position, kept while reacquiring
    pub target_center: Option<(f64, f64)>,
    /// Recent smoothed centers, oldest first
    pub trail: Vec<(f64, f64)>,
}

/// Draws the tracking overlay and encodes the result as JPEG
pub struct FrameAnnotator {
    font: Option<Font<'static>>,
    scale: Scale,
    line_height: i32,
    quality: u8,
    enabled: bool,
}

impl FrameAnnotator {
    /// A missing or unreadable font only disables the HUD text
    pub fn new(config: &StreamConfig) -> Self {
        let font = if config.overlay {
            load_font(&config.font_path)
        } else {
            None
        };

        Self {
            font,
            scale: Scale::uniform(config.font_size),
            line_height: (config.font_size * 1.4).ceil() as i32,
            quality: config.jpeg_quality.clamp(1, 100),
            enabled: config.overlay,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn annotate(&self, image: &mut RgbImage, info: &OverlayInfo) {
        if !self.enabled {
            return;
        }

        if let Some(bbox) = info.detection_box {
            draw_box(image, &bbox);
        }

        draw_trail(image, &info.trail);

        if let Some((nx, ny)) = info.target_center {
            let (x, y) = denormalize_point(nx, ny, image.width(), image.height());
            draw_crosshair(image, x as f32, y as f32);
        }

        if let Some(font) = &self.font {
            self.draw_hud(image, font, info);
        }
    }

    fn draw_hud(&self, image: &mut RgbImage, font: &Font<'static>, info: &OverlayInfo) {
        let position = match info.target_center {
            Some((nx, ny)) => {
                let (x, y) = denormalize_point(nx, ny, image.width(), image.height());
                format!("Pos: ({},{})", x.round() as i64, y.round() as i64)
            }
            None => "Pos: -".to_string(),
        };
        let lines = [
            (format!("{:4.1} fps", info.fps), FPS_COLOR),
            (
                format!("Conf: {:.2}", info.confidence.unwrap_or(0.0)),
                CONF_COLOR,
            ),
            (position, POS_COLOR),
            (
                format!("Detector: {}", info.detector_used.as_str()),
                DETECTOR_COLOR,
            ),
            (info.mode.status_text().to_string(), STATUS_COLOR),
        ];

        for (row, (text, color)) in lines.iter().enumerate() {
            let y = 4 + row as i32 * self.line_height;
            draw_text_mut(image, *color, 5, y, self.scale, font, text);
        }
    }

    /// Encode at the configured quality
    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        encode_jpeg(image, self.quality)
    }
}

fn load_font(path: &str) -> Option<Font<'static>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!("HUD font '{}' unavailable ({}); drawing without text", path, e);
            return None;
        }
    };

    match Font::try_from_vec(data) {
        Some(font) => {
            debug!("Loaded HUD font {}", path);
            Some(font)
        }
        None => {
            warn!("Failed to parse HUD font '{}'; drawing without text", path);
            None
        }
    }
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox) {
    let width = bbox.width.round().max(1.0) as u32;
    let height = bbox.height.round().max(1.0) as u32;
    let rect = Rect::at(bbox.x.round() as i32, bbox.y.round() as i32).of_size(width, height);
    draw_hollow_rect_mut(image, rect, BOX_COLOR);

    // Second ring for a 2 px outline
    if width > 2 && height > 2 {
        let inner = Rect::at(bbox.x.round() as i32 + 1, bbox.y.round() as i32 + 1)
            .of_size(width - 2, height - 2);
        draw_hollow_rect_mut(image, inner, BOX_COLOR);
    }
}

fn draw_trail(image: &mut RgbImage, trail: &[(f64, f64)]) {
    let (width, height) = image.dimensions();
    let points: Vec<(f32, f32)> = trail
        .iter()
        .map(|&(nx, ny)| {
            let (x, y) = denormalize_point(nx, ny, width, height);
            (x as f32, y as f32)
        })
        .collect();

    for segment in points.windows(2) {
        draw_line_segment_mut(image, segment[0], segment[1], TRAIL_COLOR);
    }
}

fn draw_crosshair(image: &mut RgbImage, x: f32, y: f32) {
    let arms = [
        ((x - CROSSHAIR_ARM, y), (x - CROSSHAIR_GAP, y)),
        ((x + CROSSHAIR_GAP, y), (x + CROSSHAIR_ARM, y)),
        ((x, y - CROSSHAIR_ARM), (x, y - CROSSHAIR_GAP)),
        ((x, y + CROSSHAIR_GAP), (x, y + CROSSHAIR_ARM)),
    ];
    for (start, end) in arms {
        draw_line_segment_mut(image, start, end, CROSSHAIR_COLOR);
    }
    draw_hollow_circle_mut(
        image,
        (x.round() as i32, y.round() as i32),
        CROSSHAIR_RADIUS,
        CROSSHAIR_COLOR,
    );
}

/// Encode an RGB image as baseline JPEG
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
        .encode(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
        .map_err(|e| StreamError::Encoding {
            details: format!("JPEG encode failed: {}", e),
        })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackcamConfig;

    fn annotator(overlay: bool) -> FrameAnnotator {
        let mut config = TrackcamConfig::default().stream;
        config.overlay = overlay;
        config.font_path = "/nonexistent/font.ttf".to_string();
        FrameAnnotator::new(&config)
    }

    fn info() -> OverlayInfo {
        OverlayInfo {
            mode: TrackerMode::Tracking,
            fps: 14.8,
            detection_box: Some(BoundingBox::new(10.0, 10.0, 20.0, 20.0)),
            confidence: Some(0.9),
            detector_used: DetectorUsed::Face,
            target_center: Some((0.0, 0.0)),
            trail: Vec::new(),
        }
    }

    #[test]
    fn test_missing_font_still_draws_shapes() {
        let annotator = annotator(true);
        assert!(!annotator.has_font());

        let mut image = RgbImage::new(64, 48);
        annotator.annotate(&mut image, &info());

        assert_eq!(*image.get_pixel(10, 10), BOX_COLOR);
        // Circle around the frame center
        assert_eq!(*image.get_pixel(32 + 8, 24), CROSSHAIR_COLOR);
        // Gap in the middle of the crosshair
        assert_eq!(*image.get_pixel(32, 24), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_trail_joins_recent_centers() {
        let annotator = annotator(true);
        let mut image = RgbImage::new(64, 48);
        let info = OverlayInfo {
            detection_box: None,
            target_center: None,
            trail: vec![(-0.5, 0.5), (0.5, 0.5)],
            ..info()
        };
        annotator.annotate(&mut image, &info);

        // Horizontal segment from x=16 to x=48 at y=36
        assert_eq!(*image.get_pixel(16, 36), TRAIL_COLOR);
        assert_eq!(*image.get_pixel(32, 36), TRAIL_COLOR);
        assert_eq!(*image.get_pixel(48, 36), TRAIL_COLOR);
        assert_eq!(*image.get_pixel(32, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_overlay_disabled_leaves_frame_untouched() {
        let annotator = annotator(false);
        let mut image = RgbImage::new(64, 48);
        annotator.annotate(&mut image, &info());
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_encode_produces_decodable_jpeg() {
        let image = RgbImage::from_pixel(32, 16, Rgb([120, 60, 30]));
        let jpeg = encode_jpeg(&image, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }
}
