mod context;
mod fps;
mod runner;
#[cfg(test)]
mod tests;

pub use context::{AngleCommand, ControlContext};
pub use fps::FpsEstimator;
pub use runner::{CycleOutcome, CycleReport, LoopSummary, TrackingLoop};
