mod driver;
mod pca9685;

pub use driver::{open_servo_driver, LogServoDriver, ServoDriver};
pub use pca9685::{angle_to_pulse_us, prescale_for, pulse_to_counts, Pca9685Driver};
