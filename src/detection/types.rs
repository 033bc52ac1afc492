use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which detector family produced a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetClass {
    Face,
    Body,
}

impl TargetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetClass::Face => "face",
            TargetClass::Body => "body",
        }
    }
}

/// Detector whose result was trusted for a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorUsed {
    Face,
    Body,
    #[default]
    None,
}

impl From<Option<TargetClass>> for DetectorUsed {
    fn from(class: Option<TargetClass>) -> Self {
        match class {
            Some(TargetClass::Face) => DetectorUsed::Face,
            Some(TargetClass::Body) => DetectorUsed::Body,
            None => DetectorUsed::None,
        }
    }
}

impl DetectorUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorUsed::Face => "face",
            DetectorUsed::Body => "body",
            DetectorUsed::None => "none",
        }
    }
}

/// Axis-aligned box in pixel coordinates; (x, y) is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from corner coordinates, as SSD-style detectors report them
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One scored box produced by a detector in a single cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class: TargetClass,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32, class: TargetClass) -> Self {
        Self {
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
            class,
        }
    }

    /// Ranking used to pick the best box of one class: confidence first,
    /// larger area breaks ties.
    pub fn rank(&self, other: &Detection) -> Ordering {
        self.confidence
            .total_cmp(&other.confidence)
            .then_with(|| self.bbox.area().total_cmp(&other.bbox.area()))
    }

    /// Pick the strongest detection from a list
    pub fn best_of<'a, I>(detections: I) -> Option<Detection>
    where
        I: IntoIterator<Item = &'a Detection>,
    {
        detections
            .into_iter()
            .copied()
            .max_by(|a, b| a.rank(b))
    }
}
