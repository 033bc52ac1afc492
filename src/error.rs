use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    #[error("Servo error: {0}")]
    Servo(#[from] ServoError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

/// Failures of the frame source
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera device {device}: {details}")]
    DeviceOpen { device: u32, details: String },

    #[error("Camera configuration failed: {details}")]
    Configuration { details: String },

    #[error("No frame available: {details}")]
    NoFrame { details: String },

    #[error("Frame decode failed: {details}")]
    Decode { details: String },

    #[error("Camera disconnected after {failures} consecutive capture failures")]
    Disconnected { failures: u32 },
}

/// Failures raised by a detector's inference call
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("{detector} inference failed: {details}")]
    Inference { detector: String, details: String },

    #[error("{detector} could not read frame: {details}")]
    Frame { detector: String, details: String },
}

/// Failures of the actuator driver
#[derive(Error, Debug)]
pub enum ServoError {
    #[error("Failed to open servo bus {path}: {source}")]
    BusOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Servo bus write failed: {details}")]
    Write { details: String },

    #[error("Servo driver not supported on this platform")]
    Unsupported,
}

/// Failures of the presentation layer
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to bind {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream server startup failed: {details}")]
    StartupFailed { details: String },

    #[error("Frame encoding failed: {details}")]
    Encoding { details: String },
}

impl TrackcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Only configuration problems and a lost camera stop the tracker
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackcamError::Config(_)
                | TrackcamError::Camera(CameraError::Disconnected { .. })
                | TrackcamError::System { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackcamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lost_camera_and_config_are_fatal() {
        assert!(TrackcamError::from(CameraError::Disconnected { failures: 31 }).is_fatal());
        assert!(!TrackcamError::from(CameraError::NoFrame {
            details: "timeout".to_string()
        })
        .is_fatal());
        assert!(!TrackcamError::from(ServoError::Unsupported).is_fatal());
        assert!(!TrackcamError::from(DetectorError::Inference {
            detector: "motion".to_string(),
            details: "bad input".to_string(),
        })
        .is_fatal());
    }
}
