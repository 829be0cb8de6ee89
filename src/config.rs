//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, and every section may be omitted, so an empty
//! file is a valid configuration.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{BridgeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Gamepad input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Explicit `/dev/input/eventX` path; empty means auto-detect.
    #[serde(default)]
    pub device_path: String,

    /// Stick and trigger ranges, used only for axes the device's absinfo
    /// does not describe.
    #[serde(default = "default_stick_min")]
    pub stick_min: i32,

    #[serde(default = "default_stick_max")]
    pub stick_max: i32,

    #[serde(default = "default_trigger_max")]
    pub trigger_max: i32,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    #[serde(default = "default_trigger_deadzone")]
    pub trigger_deadzone: i32,

    #[serde(default = "default_drive_deadzone")]
    pub drive_deadzone: i32,

    #[serde(default = "default_eye_step_deg")]
    pub eye_step_deg: f32,
}

/// Serial actuator link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_link_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound for one batched write plus flush
    #[serde(default = "default_link_timeout_ms")]
    pub timeout_ms: u64,

    /// Commands buffered between the control loop and the writer task
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_stick_min() -> i32 { -32768 }
fn default_stick_max() -> i32 { 32767 }
fn default_trigger_max() -> i32 { 1023 }
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_tick_rate_hz() -> u32 { 50 }
fn default_trigger_deadzone() -> i32 { 5 }
fn default_drive_deadzone() -> i32 { 40 }
fn default_eye_step_deg() -> f32 { 1.8 }

fn default_link_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_link_timeout_ms() -> u64 { 100 }
fn default_queue_capacity() -> usize { 64 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 100 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            stick_min: default_stick_min(),
            stick_max: default_stick_max(),
            trigger_max: default_trigger_max(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
            trigger_deadzone: default_trigger_deadzone(),
            drive_deadzone: default_drive_deadzone(),
            eye_step_deg: default_eye_step_deg(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: default_link_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_link_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
            format: default_log_format(),
        }
    }
}

/// Build a validation error
fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use animatronic_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Tick period derived from `control.tick_rate_hz`
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / u64::from(self.control.tick_rate_hz))
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Input ranges
        if self.input.stick_min >= self.input.stick_max {
            return Err(invalid("stick_min must be less than stick_max"));
        }

        if self.input.trigger_max <= 0 {
            return Err(invalid("trigger_max must be greater than 0"));
        }

        if self.input.reconnect_interval_ms == 0 || self.input.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        // Control loop
        if self.control.tick_rate_hz == 0 || self.control.tick_rate_hz > 1000 {
            return Err(invalid("tick_rate_hz must be between 1 and 1000"));
        }

        if !(0..=100).contains(&self.control.trigger_deadzone) {
            return Err(invalid("trigger_deadzone must be between 0 and 100"));
        }

        if !(0..=256).contains(&self.control.drive_deadzone) {
            return Err(invalid("drive_deadzone must be between 0 and 256"));
        }

        if !(self.control.eye_step_deg > 0.0 && self.control.eye_step_deg <= 10.0) {
            return Err(invalid("eye_step_deg must be greater than 0.0 and at most 10.0"));
        }

        // Serial link
        if self.link.port.is_empty() {
            return Err(invalid("link port cannot be empty"));
        }

        if ![9600, 57600, 115200, 230400, 460800, 921600].contains(&self.link.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 57600, 115200, 230400, 460800, 921600",
            ));
        }

        if self.link.timeout_ms == 0 || self.link.timeout_ms > 10000 {
            return Err(invalid("link timeout_ms must be between 1 and 10000"));
        }

        if self.link.queue_capacity == 0 {
            return Err(invalid("link queue_capacity must be greater than 0"));
        }

        // Telemetry
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}
