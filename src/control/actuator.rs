use crate::config::{AxisConfig, ServoConfig};
use serde::{Deserialize, Serialize};

/// Mechanical range of one axis, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub min: f64,
    pub max: f64,
    pub center: f64,
}

impl AxisLimits {
    pub fn clamp(&self, angle: f64) -> f64 {
        angle.clamp(self.min, self.max)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl From<AxisConfig> for AxisLimits {
    fn from(axis: AxisConfig) -> Self {
        Self {
            min: axis.min,
            max: axis.max,
            center: axis.center,
        }
    }
}

/// Commanded pan/tilt position.
///
/// Every mutation goes through [`ActuatorState::step_toward`], which keeps
/// each angle inside its limits and moves it by at most `max_step` degrees
/// per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pan: f64,
    tilt: f64,
    pan_limits: AxisLimits,
    tilt_limits: AxisLimits,
    max_step: f64,
}

impl ActuatorState {
    /// Start at the configured center position
    pub fn new(pan_limits: AxisLimits, tilt_limits: AxisLimits, max_step: f64) -> Self {
        Self {
            pan: pan_limits.clamp(pan_limits.center),
            tilt: tilt_limits.clamp(tilt_limits.center),
            pan_limits,
            tilt_limits,
            max_step: max_step.abs(),
        }
    }

    pub fn from_config(config: &ServoConfig) -> Self {
        Self::new(
            config.pan.into(),
            config.tilt.into(),
            config.max_step_per_cycle,
        )
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    pub fn angles(&self) -> (f64, f64) {
        (self.pan, self.tilt)
    }

    pub fn pan_limits(&self) -> &AxisLimits {
        &self.pan_limits
    }

    pub fn tilt_limits(&self) -> &AxisLimits {
        &self.tilt_limits
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Move toward the requested angles, clamped to range and rate limited
    pub fn step_toward(&self, pan: f64, tilt: f64) -> Self {
        Self {
            pan: limited_step(self.pan, pan, self.max_step, &self.pan_limits),
            tilt: limited_step(self.tilt, tilt, self.max_step, &self.tilt_limits),
            ..*self
        }
    }

    /// Jump straight to the center position, ignoring the rate limit.
    /// Only used for the park move at shutdown.
    pub fn centered(&self) -> Self {
        Self {
            pan: self.pan_limits.clamp(self.pan_limits.center),
            tilt: self.tilt_limits.clamp(self.tilt_limits.center),
            ..*self
        }
    }
}

fn limited_step(current: f64, requested: f64, max_step: f64, limits: &AxisLimits) -> f64 {
    if !requested.is_finite() {
        return current;
    }
    let target = limits.clamp(requested);
    let delta = (target - current).clamp(-max_step, max_step);
    limits.clamp(current + delta)
}
