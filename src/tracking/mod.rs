mod state;
mod tracker;

pub use state::{ModeTransition, TrackedTarget, TrackerMode};
pub use tracker::TargetTracker;
