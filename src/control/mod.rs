mod actuator;
mod controller;
mod scan;
#[cfg(test)]
mod tests;

pub use actuator::{ActuatorState, AxisLimits};
pub use controller::{AxisGain, ProportionalController};
pub use scan::{ScanDirection, ScanPattern};
