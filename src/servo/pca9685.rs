use super::driver::ServoDriver;
use crate::config::ServoConfig;
use crate::error::ServoError;
use tracing::{debug, info, warn};

const OSCILLATOR_HZ: f64 = 25_000_000.0;
const PWM_STEPS: f64 = 4096.0;
const SERVO_RANGE_DEG: f64 = 180.0;

const MODE1: u8 = 0x00;
const PRESCALE: u8 = 0xFE;
const LED0_ON_L: u8 = 0x06;

const MODE1_SLEEP: u8 = 0x10;
const MODE1_AUTO_INCREMENT: u8 = 0x20;
const MODE1_RESTART: u8 = 0x80;

/// Pulse width for a servo angle; angles outside 0..=180 are clamped
pub fn angle_to_pulse_us(angle: f64, min_pulse_us: f64, max_pulse_us: f64) -> f64 {
    let angle = angle.clamp(0.0, SERVO_RANGE_DEG);
    min_pulse_us + (angle / SERVO_RANGE_DEG) * (max_pulse_us - min_pulse_us)
}

/// 12-bit off count for a pulse width at the given PWM frequency
pub fn pulse_to_counts(pulse_us: f64, frequency_hz: f64) -> u16 {
    let period_us = 1_000_000.0 / frequency_hz;
    let counts = (pulse_us * PWM_STEPS / period_us).round();
    counts.clamp(0.0, PWM_STEPS - 1.0) as u16
}

/// PRESCALE register value for an output frequency
pub fn prescale_for(frequency_hz: f64) -> u8 {
    let prescale = (OSCILLATOR_HZ / (PWM_STEPS * frequency_hz)).round() - 1.0;
    prescale.clamp(3.0, 255.0) as u8
}

/// PCA9685 16-channel PWM board on a Linux i2c-dev bus
pub struct Pca9685Driver {
    bus: I2cBus,
    pan_channel: u8,
    tilt_channel: u8,
    frequency_hz: f64,
    min_pulse_us: f64,
    max_pulse_us: f64,
}

impl Pca9685Driver {
    pub fn open(config: &ServoConfig) -> Result<Self, ServoError> {
        let bus = I2cBus::open(config.i2c_bus, config.i2c_address)?;
        let mut driver = Self {
            bus,
            pan_channel: config.pan_channel,
            tilt_channel: config.tilt_channel,
            frequency_hz: config.pwm_frequency_hz,
            min_pulse_us: config.min_pulse_us,
            max_pulse_us: config.max_pulse_us,
        };
        driver.configure()?;

        info!(
            "PCA9685 ready on i2c-{} address 0x{:02x} at {} Hz",
            config.i2c_bus, config.i2c_address, config.pwm_frequency_hz
        );
        Ok(driver)
    }

    fn configure(&mut self) -> Result<(), ServoError> {
        let prescale = prescale_for(self.frequency_hz);
        debug!("PCA9685 prescale {}", prescale);

        // Prescale can only be written while the oscillator sleeps
        self.bus.write(&[MODE1, MODE1_SLEEP])?;
        self.bus.write(&[PRESCALE, prescale])?;
        self.bus.write(&[MODE1, 0x00])?;
        std::thread::sleep(std::time::Duration::from_millis(5));
        self.bus
            .write(&[MODE1, MODE1_RESTART | MODE1_AUTO_INCREMENT])?;
        Ok(())
    }

    fn set_channel_counts(&mut self, channel: u8, off: u16) -> Result<(), ServoError> {
        let register = LED0_ON_L + 4 * channel;
        self.bus.write(&[
            register,
            0x00,
            0x00,
            (off & 0xFF) as u8,
            (off >> 8) as u8,
        ])
    }

    fn set_channel_angle(&mut self, channel: u8, angle: f64) -> Result<(), ServoError> {
        let pulse = angle_to_pulse_us(angle, self.min_pulse_us, self.max_pulse_us);
        let counts = pulse_to_counts(pulse, self.frequency_hz);
        self.set_channel_counts(channel, counts)
    }
}

impl ServoDriver for Pca9685Driver {
    fn name(&self) -> &str {
        "pca9685"
    }

    fn set_angles(&mut self, pan: f64, tilt: f64) -> Result<(), ServoError> {
        self.set_channel_angle(self.pan_channel, pan)?;
        self.set_channel_angle(self.tilt_channel, tilt)
    }

    fn release(&mut self) -> Result<(), ServoError> {
        let pan = self.set_channel_counts(self.pan_channel, 0);
        let tilt = self.set_channel_counts(self.tilt_channel, 0);
        if pan.is_ok() && tilt.is_ok() {
            info!("PCA9685 outputs released");
        } else {
            warn!("Failed to release one or more PCA9685 outputs");
        }
        pan.and(tilt)
    }
}

#[cfg(target_os = "linux")]
struct I2cBus {
    file: std::fs::File,
}

#[cfg(target_os = "linux")]
impl I2cBus {
    const I2C_SLAVE: libc::c_ulong = 0x0703;

    fn open(bus: u32, address: u16) -> Result<Self, ServoError> {
        use std::os::unix::io::AsRawFd;

        let path = format!("/dev/i2c-{}", bus);
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| ServoError::BusOpen {
                path: path.clone(),
                source,
            })?;

        let rc = unsafe {
            libc::ioctl(
                file.as_raw_fd(),
                Self::I2C_SLAVE as _,
                address as libc::c_ulong,
            )
        };
        if rc < 0 {
            return Err(ServoError::BusOpen {
                path,
                source: std::io::Error::last_os_error(),
            });
        }

        Ok(Self { file })
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ServoError> {
        use std::io::Write;

        self.file.write_all(bytes).map_err(|e| ServoError::Write {
            details: format!("register 0x{:02x}: {}", bytes.first().copied().unwrap_or(0), e),
        })
    }
}

#[cfg(not(target_os = "linux"))]
struct I2cBus;

#[cfg(not(target_os = "linux"))]
impl I2cBus {
    fn open(_bus: u32, _address: u16) -> Result<Self, ServoError> {
        Err(ServoError::Unsupported)
    }

    fn write(&mut self, _bytes: &[u8]) -> Result<(), ServoError> {
        Err(ServoError::Unsupported)
    }
}
