use super::pca9685::Pca9685Driver;
use crate::config::ServoConfig;
use crate::error::{Result, ServoError};
use tracing::{debug, info};

/// Physical pan/tilt output.
///
/// Commands are fire-and-forget: the driver writes the angles and returns
/// without waiting for the servos to get there.
pub trait ServoDriver: Send {
    fn name(&self) -> &str;

    /// Command both servos to absolute angles in degrees
    fn set_angles(&mut self, pan: f64, tilt: f64) -> std::result::Result<(), ServoError>;

    /// Stop driving the servos so they go limp
    fn release(&mut self) -> std::result::Result<(), ServoError> {
        Ok(())
    }
}

/// Driver that only logs what it would do
#[derive(Debug, Default)]
pub struct LogServoDriver {
    last: Option<(f64, f64)>,
    commands: u64,
    released: bool,
}

impl LogServoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn last_angles(&self) -> Option<(f64, f64)> {
        self.last
    }

    #[cfg(test)]
    pub fn command_count(&self) -> u64 {
        self.commands
    }

    #[cfg(test)]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl ServoDriver for LogServoDriver {
    fn name(&self) -> &str {
        "log"
    }

    fn set_angles(&mut self, pan: f64, tilt: f64) -> std::result::Result<(), ServoError> {
        if self.last != Some((pan, tilt)) {
            debug!("Servo command: pan {:.1} tilt {:.1}", pan, tilt);
        }
        self.last = Some((pan, tilt));
        self.commands += 1;
        self.released = false;
        Ok(())
    }

    fn release(&mut self) -> std::result::Result<(), ServoError> {
        info!(
            "Servo outputs released (log driver) after {} commands, last {:?}",
            self.commands, self.last
        );
        self.released = true;
        Ok(())
    }
}

/// Open the configured driver. `force_log` overrides the config.
pub fn open_servo_driver(config: &ServoConfig, force_log: bool) -> Result<Box<dyn ServoDriver>> {
    if force_log || config.driver == "log" {
        info!("Using log-only servo driver");
        return Ok(Box::new(LogServoDriver::new()));
    }

    match config.driver.as_str() {
        "pca9685" => Ok(Box::new(Pca9685Driver::open(config)?)),
        other => Err(crate::error::TrackcamError::component(
            "servo",
            &format!("unknown servo driver '{}'", other),
        )),
    }
}
