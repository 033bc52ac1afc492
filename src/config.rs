use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrackcamConfig {
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    pub tracker: TrackerConfig,
    pub servo: ServoConfig,
    pub scan: ScanConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_device")]
    pub device: u32,

    /// Camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Target control loop rate; cycles never run faster than this
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Consecutive capture failures tolerated before the camera is declared lost
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Use a synthetic moving test pattern instead of a real camera
    #[serde(default)]
    pub synthetic: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectionConfig {
    /// Face results at or above this confidence win outright
    #[serde(default = "default_face_confidence_threshold")]
    pub face_confidence_threshold: f32,

    /// Body fallback results below this confidence are discarded
    #[serde(default = "default_body_confidence_threshold")]
    pub body_confidence_threshold: f32,

    /// Smallest face box considered, in pixels of area
    #[serde(default = "default_min_face_area_px")]
    pub min_face_area_px: u32,

    /// Smallest body box considered, as a fraction of the frame area
    #[serde(default = "default_min_body_area_fraction")]
    pub min_body_area_fraction: f32,

    /// Per-pixel luminance delta that counts as motion
    #[serde(default = "default_motion_delta_threshold")]
    pub motion_delta_threshold: u8,

    /// Blob coverage (fraction of frame) that maps to full confidence
    #[serde(default = "default_motion_full_confidence_fraction")]
    pub motion_full_confidence_fraction: f32,

    /// Integer downscale applied before motion analysis
    #[serde(default = "default_motion_downscale")]
    pub motion_downscale: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrackerConfig {
    /// Exponential smoothing weight given to the newest measurement
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,

    /// Consecutive misses while tracking before the actuator freezes
    #[serde(default = "default_miss_threshold")]
    pub miss_threshold: u32,

    /// Further consecutive misses before scanning resumes
    #[serde(default = "default_reacquire_misses")]
    pub reacquire_misses: u32,

    /// Number of recent target centers drawn as the overlay trail
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct AxisConfig {
    pub min: f64,
    pub max: f64,
    pub center: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServoConfig {
    #[serde(default = "default_pan_axis")]
    pub pan: AxisConfig,

    #[serde(default = "default_tilt_axis")]
    pub tilt: AxisConfig,

    /// Degrees of pan per unit of normalized horizontal error
    #[serde(default = "default_kp_pan")]
    pub kp_pan: f64,

    /// Degrees of tilt per unit of normalized vertical error
    #[serde(default = "default_kp_tilt")]
    pub kp_tilt: f64,

    /// Normalized error band inside which no correction is issued
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,

    /// Hard cap on angle change per control cycle, in degrees
    #[serde(default = "default_max_step_per_cycle")]
    pub max_step_per_cycle: f64,

    #[serde(default)]
    pub invert_pan: bool,

    #[serde(default)]
    pub invert_tilt: bool,

    /// Actuator backend: "pca9685" or "log"
    #[serde(default = "default_servo_driver")]
    pub driver: String,

    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u32,

    #[serde(default = "default_i2c_address")]
    pub i2c_address: u16,

    #[serde(default = "default_pan_channel")]
    pub pan_channel: u8,

    #[serde(default = "default_tilt_channel")]
    pub tilt_channel: u8,

    #[serde(default = "default_pwm_frequency_hz")]
    pub pwm_frequency_hz: f64,

    #[serde(default = "default_min_pulse_us")]
    pub min_pulse_us: f64,

    #[serde(default = "default_max_pulse_us")]
    pub max_pulse_us: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    /// Pan travel per cycle while searching, in degrees
    #[serde(default = "default_scan_step_degrees")]
    pub step_degrees: f64,

    /// Peak tilt excursion from center while searching, in degrees
    #[serde(default = "default_scan_tilt_amplitude")]
    pub tilt_amplitude: f64,

    /// Tilt half-waves per pan sweep
    #[serde(default = "default_scan_tilt_waves")]
    pub tilt_waves: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StreamConfig {
    /// IP address to bind to
    #[serde(default = "default_stream_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_stream_port")]
    pub port: u16,

    /// JPEG quality of published frames (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Draw detection boxes, crosshair and HUD onto published frames
    #[serde(default = "default_overlay")]
    pub overlay: bool,

    /// Path to TrueType font file for HUD text
    #[serde(default = "default_font_path")]
    pub font_path: String,

    /// Font size for HUD text
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

impl TrackcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("trackcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let pan = default_pan_axis();
        let tilt = default_tilt_axis();

        let settings = Config::builder()
            .set_default("camera.device", default_camera_device())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default(
                "camera.max_consecutive_failures",
                default_max_consecutive_failures(),
            )?
            .set_default("camera.synthetic", false)?
            .set_default(
                "detection.face_confidence_threshold",
                default_face_confidence_threshold() as f64,
            )?
            .set_default(
                "detection.body_confidence_threshold",
                default_body_confidence_threshold() as f64,
            )?
            .set_default("detection.min_face_area_px", default_min_face_area_px())?
            .set_default(
                "detection.min_body_area_fraction",
                default_min_body_area_fraction() as f64,
            )?
            .set_default(
                "detection.motion_delta_threshold",
                default_motion_delta_threshold() as i64,
            )?
            .set_default(
                "detection.motion_full_confidence_fraction",
                default_motion_full_confidence_fraction() as f64,
            )?
            .set_default("detection.motion_downscale", default_motion_downscale())?
            .set_default("tracker.smoothing_alpha", default_smoothing_alpha())?
            .set_default("tracker.miss_threshold", default_miss_threshold())?
            .set_default("tracker.reacquire_misses", default_reacquire_misses())?
            .set_default("tracker.history_len", default_history_len() as i64)?
            .set_default("servo.pan.min", pan.min)?
            .set_default("servo.pan.max", pan.max)?
            .set_default("servo.pan.center", pan.center)?
            .set_default("servo.tilt.min", tilt.min)?
            .set_default("servo.tilt.max", tilt.max)?
            .set_default("servo.tilt.center", tilt.center)?
            .set_default("servo.kp_pan", default_kp_pan())?
            .set_default("servo.kp_tilt", default_kp_tilt())?
            .set_default("servo.dead_zone", default_dead_zone())?
            .set_default("servo.max_step_per_cycle", default_max_step_per_cycle())?
            .set_default("servo.invert_pan", false)?
            .set_default("servo.invert_tilt", false)?
            .set_default("servo.driver", default_servo_driver())?
            .set_default("servo.i2c_bus", default_i2c_bus())?
            .set_default("servo.i2c_address", default_i2c_address())?
            .set_default("servo.pan_channel", default_pan_channel() as i64)?
            .set_default("servo.tilt_channel", default_tilt_channel() as i64)?
            .set_default("servo.pwm_frequency_hz", default_pwm_frequency_hz())?
            .set_default("servo.min_pulse_us", default_min_pulse_us())?
            .set_default("servo.max_pulse_us", default_max_pulse_us())?
            .set_default("scan.step_degrees", default_scan_step_degrees())?
            .set_default("scan.tilt_amplitude", default_scan_tilt_amplitude())?
            .set_default("scan.tilt_waves", default_scan_tilt_waves())?
            .set_default("stream.ip", default_stream_ip())?
            .set_default("stream.port", default_stream_port())?
            .set_default("stream.jpeg_quality", default_jpeg_quality() as i64)?
            .set_default("stream.overlay", default_overlay())?
            .set_default("stream.font_path", default_font_path())?
            .set_default("stream.font_size", default_font_size() as f64)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with TRACKCAM_ prefix
            .add_source(Environment::with_prefix("TRACKCAM").separator("__"))
            .build()?;

        let config: TrackcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.max_consecutive_failures == 0 {
            return Err(ConfigError::Message(
                "Camera max_consecutive_failures must be greater than 0".to_string(),
            ));
        }

        check_unit_interval(
            "detection.face_confidence_threshold",
            self.detection.face_confidence_threshold as f64,
        )?;
        check_unit_interval(
            "detection.body_confidence_threshold",
            self.detection.body_confidence_threshold as f64,
        )?;
        check_unit_interval(
            "detection.min_body_area_fraction",
            self.detection.min_body_area_fraction as f64,
        )?;

        if !(self.detection.motion_full_confidence_fraction > 0.0
            && self.detection.motion_full_confidence_fraction <= 1.0)
        {
            return Err(ConfigError::Message(
                "detection.motion_full_confidence_fraction must be in (0, 1]".to_string(),
            ));
        }

        if self.detection.motion_downscale == 0 {
            return Err(ConfigError::Message(
                "detection.motion_downscale must be greater than 0".to_string(),
            ));
        }

        if !(self.tracker.smoothing_alpha > 0.0 && self.tracker.smoothing_alpha <= 1.0) {
            return Err(ConfigError::Message(
                "tracker.smoothing_alpha must be in (0, 1]".to_string(),
            ));
        }

        if self.tracker.miss_threshold == 0 || self.tracker.reacquire_misses == 0 {
            return Err(ConfigError::Message(
                "Tracker miss thresholds must be greater than 0".to_string(),
            ));
        }

        check_axis("servo.pan", &self.servo.pan)?;
        check_axis("servo.tilt", &self.servo.tilt)?;

        if !is_positive(self.servo.kp_pan) || !is_positive(self.servo.kp_tilt) {
            return Err(ConfigError::Message(
                "Servo gains must be greater than 0".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.servo.dead_zone) {
            return Err(ConfigError::Message(
                "servo.dead_zone must be in [0, 1)".to_string(),
            ));
        }

        if !is_positive(self.servo.max_step_per_cycle) {
            return Err(ConfigError::Message(
                "servo.max_step_per_cycle must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.servo.driver.as_str(), "pca9685" | "log") {
            return Err(ConfigError::Message(format!(
                "Unknown servo driver '{}', expected \"pca9685\" or \"log\"",
                self.servo.driver
            )));
        }

        if self.servo.pan_channel > 15 || self.servo.tilt_channel > 15 {
            return Err(ConfigError::Message(
                "PCA9685 channels must be in 0..=15".to_string(),
            ));
        }

        if self.servo.pan_channel == self.servo.tilt_channel {
            return Err(ConfigError::Message(
                "Pan and tilt must use different servo channels".to_string(),
            ));
        }

        if !is_positive(self.servo.pwm_frequency_hz)
            || !is_positive(self.servo.min_pulse_us)
            || !(self.servo.max_pulse_us.is_finite()
                && self.servo.max_pulse_us > self.servo.min_pulse_us)
        {
            return Err(ConfigError::Message(
                "Servo PWM frequency and pulse range are invalid".to_string(),
            ));
        }

        if !is_positive(self.scan.step_degrees) {
            return Err(ConfigError::Message(
                "scan.step_degrees must be greater than 0".to_string(),
            ));
        }

        if self.scan.step_degrees > self.servo.max_step_per_cycle {
            return Err(ConfigError::Message(format!(
                "scan.step_degrees ({}) exceeds servo.max_step_per_cycle ({})",
                self.scan.step_degrees, self.servo.max_step_per_cycle
            )));
        }

        if !(self.scan.tilt_amplitude.is_finite() && self.scan.tilt_amplitude >= 0.0)
            || !(self.scan.tilt_waves.is_finite() && self.scan.tilt_waves >= 0.0)
        {
            return Err(ConfigError::Message(
                "Scan tilt amplitude and waves must be finite and not negative".to_string(),
            ));
        }

        let tilt_step = self.scan_tilt_step();
        if tilt_step > self.servo.max_step_per_cycle {
            return Err(ConfigError::Message(format!(
                "Scan tilt moves up to {:.2} degrees per cycle, above \
                 servo.max_step_per_cycle ({}); lower scan.tilt_amplitude or scan.tilt_waves",
                tilt_step, self.servo.max_step_per_cycle
            )));
        }

        if self.stream.jpeg_quality == 0 || self.stream.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "stream.jpeg_quality must be in 1..=100".to_string(),
            ));
        }

        if !is_positive(self.stream.font_size as f64) {
            return Err(ConfigError::Message(
                "stream.font_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Steepest tilt change per cycle requested by the scan sweep.
    ///
    /// Tilt is `amplitude * sin(pi * waves * offset / half_span)` over pan, so
    /// its slope peaks at `amplitude * pi * waves / half_span` per degree of pan.
    pub fn scan_tilt_step(&self) -> f64 {
        let half_span = (self.servo.pan.max - self.servo.pan.min) / 2.0;
        if half_span <= 0.0 {
            return 0.0;
        }
        let slope = self.scan.tilt_amplitude * std::f64::consts::PI * self.scan.tilt_waves;
        slope * self.scan.step_degrees / half_span
    }
}

/// Finite and strictly positive
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Message(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_axis(name: &str, axis: &AxisConfig) -> Result<(), ConfigError> {
    if !axis.min.is_finite() || !axis.max.is_finite() || axis.min >= axis.max {
        return Err(ConfigError::Message(format!(
            "{} range is invalid: min {} must be below max {}",
            name, axis.min, axis.max
        )));
    }

    if !(axis.center >= axis.min && axis.center <= axis.max) {
        return Err(ConfigError::Message(format!(
            "{} center {} lies outside [{}, {}]",
            name, axis.center, axis.min, axis.max
        )));
    }

    if axis.min < 0.0 || axis.max > 180.0 {
        return Err(ConfigError::Message(format!(
            "{} range must stay within the servo's 0-180 degree travel",
            name
        )));
    }

    Ok(())
}

impl Default for TrackcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                device: default_camera_device(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                max_consecutive_failures: default_max_consecutive_failures(),
                synthetic: false,
            },
            detection: DetectionConfig {
                face_confidence_threshold: default_face_confidence_threshold(),
                body_confidence_threshold: default_body_confidence_threshold(),
                min_face_area_px: default_min_face_area_px(),
                min_body_area_fraction: default_min_body_area_fraction(),
                motion_delta_threshold: default_motion_delta_threshold(),
                motion_full_confidence_fraction: default_motion_full_confidence_fraction(),
                motion_downscale: default_motion_downscale(),
            },
            tracker: TrackerConfig {
                smoothing_alpha: default_smoothing_alpha(),
                miss_threshold: default_miss_threshold(),
                reacquire_misses: default_reacquire_misses(),
                history_len: default_history_len(),
            },
            servo: ServoConfig {
                pan: default_pan_axis(),
                tilt: default_tilt_axis(),
                kp_pan: default_kp_pan(),
                kp_tilt: default_kp_tilt(),
                dead_zone: default_dead_zone(),
                max_step_per_cycle: default_max_step_per_cycle(),
                invert_pan: false,
                invert_tilt: false,
                driver: default_servo_driver(),
                i2c_bus: default_i2c_bus(),
                i2c_address: default_i2c_address(),
                pan_channel: default_pan_channel(),
                tilt_channel: default_tilt_channel(),
                pwm_frequency_hz: default_pwm_frequency_hz(),
                min_pulse_us: default_min_pulse_us(),
                max_pulse_us: default_max_pulse_us(),
            },
            scan: ScanConfig {
                step_degrees: default_scan_step_degrees(),
                tilt_amplitude: default_scan_tilt_amplitude(),
                tilt_waves: default_scan_tilt_waves(),
            },
            stream: StreamConfig {
                ip: default_stream_ip(),
                port: default_stream_port(),
                jpeg_quality: default_jpeg_quality(),
                overlay: default_overlay(),
                font_path: default_font_path(),
                font_size: default_font_size(),
            },
        }
    }
}

// Default value functions
fn default_camera_device() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (320, 240)
}
fn default_camera_fps() -> u32 {
    15
}
fn default_max_consecutive_failures() -> u32 {
    50
}

fn default_face_confidence_threshold() -> f32 {
    0.5
}
fn default_body_confidence_threshold() -> f32 {
    0.5
}
fn default_min_face_area_px() -> u32 {
    225
}
fn default_min_body_area_fraction() -> f32 {
    0.02
}
fn default_motion_delta_threshold() -> u8 {
    25
}
fn default_motion_full_confidence_fraction() -> f32 {
    0.1
}
fn default_motion_downscale() -> u32 {
    2
}

fn default_smoothing_alpha() -> f64 {
    0.6
}
fn default_miss_threshold() -> u32 {
    5
}
fn default_reacquire_misses() -> u32 {
    25
}
fn default_history_len() -> usize {
    30
}

fn default_pan_axis() -> AxisConfig {
    AxisConfig {
        min: 20.0,
        max: 160.0,
        center: 90.0,
    }
}
fn default_tilt_axis() -> AxisConfig {
    AxisConfig {
        min: 50.0,
        max: 130.0,
        center: 90.0,
    }
}
fn default_kp_pan() -> f64 {
    7.5
}
fn default_kp_tilt() -> f64 {
    5.5
}
fn default_dead_zone() -> f64 {
    0.05
}
fn default_max_step_per_cycle() -> f64 {
    4.0
}
fn default_servo_driver() -> String {
    "pca9685".to_string()
}
fn default_i2c_bus() -> u32 {
    1
}
fn default_i2c_address() -> u16 {
    0x40
}
fn default_pan_channel() -> u8 {
    0
}
fn default_tilt_channel() -> u8 {
    1
}
fn default_pwm_frequency_hz() -> f64 {
    50.0
}
fn default_min_pulse_us() -> f64 {
    500.0
}
fn default_max_pulse_us() -> f64 {
    2400.0
}

fn default_scan_step_degrees() -> f64 {
    1.0
}
fn default_scan_tilt_amplitude() -> f64 {
    20.0
}
fn default_scan_tilt_waves() -> f64 {
    4.0
}

fn default_stream_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_stream_port() -> u16 {
    5000
}
fn default_jpeg_quality() -> u8 {
    80
}
fn default_overlay() -> bool {
    true
}
fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}
fn default_font_size() -> f32 {
    14.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TrackcamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.servo.pan.center, 90.0);
        assert_eq!(config.stream.port, 5000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = TrackcamConfig::default();

        config.camera.resolution = (0, 0);
        assert!(config.validate().is_err());
        config.camera.resolution = (320, 240);
        assert!(config.validate().is_ok());

        config.servo.pan.min = 170.0;
        assert!(config.validate().is_err());
        config.servo.pan.min = 20.0;

        config.servo.tilt.center = 10.0;
        assert!(config.validate().is_err());
        config.servo.tilt.center = 90.0;

        config.servo.kp_tilt = 0.0;
        assert!(config.validate().is_err());
        config.servo.kp_tilt = 5.5;

        config.tracker.smoothing_alpha = 1.5;
        assert!(config.validate().is_err());
        config.tracker.smoothing_alpha = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scan_step_must_respect_rate_limit() {
        let mut config = TrackcamConfig::default();
        config.scan.step_degrees = config.servo.max_step_per_cycle + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let cases: [fn(&mut TrackcamConfig); 10] = [
            |c| c.servo.max_step_per_cycle = f64::NAN,
            |c| c.servo.kp_pan = f64::NAN,
            |c| c.servo.kp_tilt = f64::INFINITY,
            |c| c.servo.tilt.center = f64::NAN,
            |c| c.servo.pan.center = f64::NAN,
            |c| c.servo.dead_zone = f64::NAN,
            |c| c.scan.step_degrees = f64::NAN,
            |c| c.scan.tilt_amplitude = f64::NAN,
            |c| c.scan.tilt_waves = f64::INFINITY,
            |c| c.stream.font_size = f32::NAN,
        ];

        for (index, mutate) in cases.iter().enumerate() {
            let mut config = TrackcamConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err(), "case {} accepted", index);
        }
    }

    #[test]
    fn test_nan_loaded_from_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[servo]
max_step_per_cycle = nan
kp_pan = nan

[servo.tilt]
min = 50.0
max = 130.0
center = nan
"#
        )
        .unwrap();

        let config = TrackcamConfig::load_from_file(file.path()).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_tilt_must_respect_rate_limit() {
        let mut config = TrackcamConfig::default();
        assert!(config.scan_tilt_step() <= config.servo.max_step_per_cycle);

        // Pan 20..160 with 4 waves: 30 degrees of amplitude needs ~5.4 degrees per cycle
        config.scan.tilt_amplitude = 30.0;
        assert!(config.scan_tilt_step() > 5.0);
        assert!(config.validate().is_err());

        config.servo.max_step_per_cycle = 6.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_driver_rejected() {
        let mut config = TrackcamConfig::default();
        config.servo.driver = "stepper".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[servo]
kp_pan = 10.0
driver = "log"

[servo.pan]
min = 0.0
max = 180.0
center = 90.0

[tracker]
miss_threshold = 3
"#
        )
        .unwrap();

        let config = TrackcamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.servo.kp_pan, 10.0);
        assert_eq!(config.servo.driver, "log");
        assert_eq!(config.servo.pan.max, 180.0);
        assert_eq!(config.tracker.miss_threshold, 3);
        // Untouched sections keep their defaults
        assert_eq!(config.servo.tilt.min, 50.0);
        assert_eq!(config.stream.port, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackcamConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.camera.resolution, (320, 240));
        assert!(config.validate().is_ok());
    }
}
