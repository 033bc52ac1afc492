use super::types::{Detection, TargetClass};
use crate::error::DetectorError;
use crate::frame::FrameData;

/// A pretrained (or heuristic) object detector.
///
/// Face and body detectors share this contract; `class` tells the fusion
/// stage which role a detector fills. Implementations may keep state across
/// frames, hence `&mut self`.
pub trait Detector: Send {
    /// Role of this detector in the fusion policy
    fn class(&self) -> TargetClass;

    /// Short name for logs
    fn name(&self) -> &str;

    /// Run inference over one frame. An empty list means nothing was found.
    fn infer(&mut self, frame: &FrameData) -> Result<Vec<Detection>, DetectorError>;
}

/// Detector that never finds anything; stands in for an absent model
pub struct NullDetector {
    class: TargetClass,
}

impl NullDetector {
    pub fn new(class: TargetClass) -> Self {
        Self { class }
    }
}

impl Detector for NullDetector {
    fn class(&self) -> TargetClass {
        self.class
    }

    fn name(&self) -> &str {
        match self.class {
            TargetClass::Face => "null-face",
            TargetClass::Body => "null-body",
        }
    }

    fn infer(&mut self, _frame: &FrameData) -> Result<Vec<Detection>, DetectorError> {
        Ok(Vec::new())
    }
}
