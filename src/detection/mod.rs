mod detector;
mod fusion;
mod motion;
mod types;

pub use detector::{Detector, NullDetector};
pub use fusion::{DetectionFusion, FusionOutcome};
pub use motion::MotionDetector;
pub use types::{BoundingBox, Detection, DetectorUsed, TargetClass};
