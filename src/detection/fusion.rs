use super::detector::Detector;
use super::types::{Detection, DetectorUsed, TargetClass};
use crate::config::DetectionConfig;
use crate::frame::FrameData;
use tracing::{debug, trace, warn};

/// Result of one fusion pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOutcome {
    /// The single trusted detection, if any
    pub detection: Option<Detection>,
    /// Which detector the detection came from
    pub detector_used: DetectorUsed,
    /// Whether the body fallback had to run this cycle
    pub body_invoked: bool,
}

impl FusionOutcome {
    fn none(body_invoked: bool) -> Self {
        Self {
            detection: None,
            detector_used: DetectorUsed::None,
            body_invoked,
        }
    }
}

/// Face-first, body-fallback detection policy.
///
/// At most one detector's result is trusted per cycle; boxes from the two
/// detectors are never merged.
pub struct DetectionFusion {
    face: Box<dyn Detector>,
    body: Box<dyn Detector>,
    face_threshold: f32,
    body_threshold: f32,
    min_face_area_px: f32,
    min_body_area_fraction: f32,
}

impl DetectionFusion {
    pub fn new(face: Box<dyn Detector>, body: Box<dyn Detector>, config: &DetectionConfig) -> Self {
        if face.class() != TargetClass::Face {
            warn!(
                "Detector '{}' registered in the face slot reports class {:?}",
                face.name(),
                face.class()
            );
        }
        if body.class() != TargetClass::Body {
            warn!(
                "Detector '{}' registered in the body slot reports class {:?}",
                body.name(),
                body.class()
            );
        }

        Self {
            face,
            body,
            face_threshold: config.face_confidence_threshold,
            body_threshold: config.body_confidence_threshold,
            min_face_area_px: config.min_face_area_px as f32,
            min_body_area_fraction: config.min_body_area_fraction,
        }
    }

    /// Run the fusion policy over one frame
    pub fn fuse(&mut self, frame: &FrameData) -> FusionOutcome {
        let min_face_area = self.min_face_area_px;
        let best_face = run_detector(self.face.as_mut(), frame, TargetClass::Face, min_face_area);
        if let Some(face) = best_face {
            if face.confidence >= self.face_threshold {
                trace!(
                    "Frame {}: face {:.2} at {:?} accepted",
                    frame.id,
                    face.confidence,
                    face.bbox
                );
                return FusionOutcome {
                    detection: Some(face),
                    detector_used: DetectorUsed::Face,
                    body_invoked: false,
                };
            }
            debug!(
                "Frame {}: best face {:.2} below threshold {:.2}, trying body",
                frame.id, face.confidence, self.face_threshold
            );
        }

        let min_body_area = self.min_body_area_fraction * frame.area() as f32;
        match run_detector(self.body.as_mut(), frame, TargetClass::Body, min_body_area) {
            Some(body) if body.confidence >= self.body_threshold => {
                trace!(
                    "Frame {}: body {:.2} at {:?} accepted",
                    frame.id,
                    body.confidence,
                    body.bbox
                );
                FusionOutcome {
                    detection: Some(body),
                    detector_used: DetectorUsed::Body,
                    body_invoked: true,
                }
            }
            Some(body) => {
                debug!(
                    "Frame {}: best body {:.2} below threshold {:.2}",
                    frame.id, body.confidence, self.body_threshold
                );
                FusionOutcome::none(true)
            }
            None => FusionOutcome::none(true),
        }
    }
}

/// Run one detector, drop undersized boxes and return the strongest one.
/// Inference errors count as an empty result.
fn run_detector(
    detector: &mut dyn Detector,
    frame: &FrameData,
    role: TargetClass,
    min_area: f32,
) -> Option<Detection> {
    let detections = match detector.infer(frame) {
        Ok(detections) => detections,
        Err(e) => {
            warn!("{} detector failed on frame {}: {}", role.as_str(), frame.id, e);
            return None;
        }
    };

    let candidates: Vec<Detection> = detections
        .into_iter()
        .filter(|d| d.bbox.area() >= min_area)
        .map(|d| Detection::new(d.bbox, d.confidence, role))
        .collect();

    Detection::best_of(&candidates)
}
