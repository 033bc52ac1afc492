use super::actuator::ActuatorState;
use crate::config::ServoConfig;
use tracing::trace;

/// Gain for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisGain {
    /// Degrees per unit of normalized error
    pub kp: f64,
    /// Flip the correction direction for rigs mounted the other way round
    pub invert: bool,
}

/// Purely proportional pan/tilt controller with a dead-zone.
///
/// The error on each axis is the target's normalized offset from the frame
/// center. There is no integral or derivative term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionalController {
    pan: AxisGain,
    tilt: AxisGain,
    dead_zone: f64,
}

impl ProportionalController {
    pub fn new(pan: AxisGain, tilt: AxisGain, dead_zone: f64) -> Self {
        Self {
            pan,
            tilt,
            dead_zone: dead_zone.abs(),
        }
    }

    pub fn from_config(config: &ServoConfig) -> Self {
        Self::new(
            AxisGain {
                kp: config.kp_pan,
                invert: config.invert_pan,
            },
            AxisGain {
                kp: config.kp_tilt,
                invert: config.invert_tilt,
            },
            config.dead_zone,
        )
    }

    /// Raw correction for one axis, before clamping and rate limiting
    pub fn axis_delta(&self, error: f64, gain: AxisGain) -> f64 {
        if !error.is_finite() || error.abs() < self.dead_zone {
            return 0.0;
        }
        let delta = gain.kp * error;
        if gain.invert {
            -delta
        } else {
            delta
        }
    }

    /// Raw (pan, tilt) correction for a normalized target center
    pub fn compute_delta(&self, target_center: (f64, f64)) -> (f64, f64) {
        (
            self.axis_delta(target_center.0, self.pan),
            self.axis_delta(target_center.1, self.tilt),
        )
    }

    /// New actuator angles for a normalized target center.
    ///
    /// Subtracting the delta turns the rig toward the target, so the target
    /// drifts back toward the frame center.
    pub fn compute_command(
        &self,
        target_center: (f64, f64),
        current: &ActuatorState,
    ) -> ActuatorState {
        let (pan_delta, tilt_delta) = self.compute_delta(target_center);
        if pan_delta == 0.0 && tilt_delta == 0.0 {
            return *current;
        }

        let next = current.step_toward(current.pan() - pan_delta, current.tilt() - tilt_delta);
        trace!(
            "P-control: error ({:.3}, {:.3}) delta ({:.2}, {:.2}) -> ({:.2}, {:.2})",
            target_center.0,
            target_center.1,
            pan_delta,
            tilt_delta,
            next.pan(),
            next.tilt()
        );
        next
    }

    pub fn dead_zone(&self) -> f64 {
        self.dead_zone
    }
}
