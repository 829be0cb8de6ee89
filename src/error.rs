//! # Error Types
//!
//! Custom error types for the animatronic bridge using `thiserror`.
//!
//! The control core never fails; these errors come from the surrounding
//! plumbing (configuration, the gamepad device, the serial link and the
//! telemetry recorder).

use thiserror::Error;

/// Main error type for the animatronic bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Gamepad device errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable gamepad was found under /dev/input
    #[error("No gamepad found")]
    ControllerNotFound,

    /// Serial link errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial ports could be opened
    #[error("No actuator link found (tried: {0})")]
    SerialPortNotFound(String),

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),
}

/// Result type alias for the animatronic bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
