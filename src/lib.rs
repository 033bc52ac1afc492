pub mod app;
pub mod camera;
pub mod config;
pub mod control;
pub mod control_loop;
pub mod detection;
pub mod error;
pub mod exchange;
pub mod frame;
pub mod overlay;
pub mod servo;
pub mod tracking;

#[cfg(feature = "streaming")]
pub mod streaming;

pub use app::{OrchestratorOptions, TrackcamOrchestrator};
pub use config::TrackcamConfig;
pub use control::{ActuatorState, ProportionalController, ScanPattern};
pub use control_loop::{ControlContext, TrackingLoop};
pub use detection::{Detection, DetectionFusion, Detector, TargetClass};
pub use error::{Result, TrackcamError};
pub use exchange::{FrameEnvelope, FrameExchange, StatusSnapshot};
pub use frame::{FrameData, FrameFormat};
pub use tracking::{TargetTracker, TrackerMode};
