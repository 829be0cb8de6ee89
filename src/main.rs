//! # Animatronic Bridge
//!
//! Drive an animatronic robot from a gamepad.
//!
//! This application reads a gamepad through evdev, runs the control pipeline
//! at a fixed tick rate and streams servo and stepper commands to the
//! actuator board over a serial link.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use animatronic_bridge::actuator::ActuatorSet;
use animatronic_bridge::config::Config;
use animatronic_bridge::control::{ControlLoop, ControlParams, TickOutcome};
use animatronic_bridge::input::{gamepad, handle};
use animatronic_bridge::link::ActuatorLink;
use animatronic_bridge::telemetry::{TelemetryRecorder, TickRecord};

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of ticks between status log messages
const STATUS_LOG_INTERVAL_TICKS: u64 = 500;

/// Main entry point for the animatronic bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up non-blocking logging
///    - Load configuration (defaults if the file is missing)
///    - Start the gamepad reader thread and the actuator link task
///
/// 2. **Main Loop**
///    - Run one control tick per `tick_rate_hz` period
///    - Every actuator is re-commanded each tick, with or without a gamepad
///    - Log status every `STATUS_LOG_INTERVAL_TICKS` ticks
///    - Sample telemetry if enabled
///
/// 3. **Graceful Shutdown**
///    - Stop on Ctrl+C
///    - Drop the actuator sinks so the link task drains and exits
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - No actuator serial port can be opened
/// - The telemetry directory cannot be created
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO animatronic_bridge: Animatronic Bridge v0.1.0 starting...
/// INFO animatronic_bridge::link: Opened actuator link at /dev/ttyUSB0 (115200 baud)
/// INFO animatronic_bridge: Starting control loop at 50Hz
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (log_writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(log_writer)
        .init();

    info!("Animatronic Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(Path::new(&config_path))?;

    // Gamepad input
    let (slot, mut pad) = handle::channel();
    let input_config = config.input.clone();
    std::thread::Builder::new()
        .name("gamepad-reader".to_string())
        .spawn(move || gamepad::run_reader(input_config, slot))
        .context("Failed to spawn gamepad reader thread")?;

    // Actuator link
    let link = ActuatorLink::open(&config.link)?;
    info!(
        "Actuator link opened at: {} (write timeout {:?})",
        link.device_path(),
        link.write_timeout()
    );
    let (queue, commands) = mpsc::channel(config.link.queue_capacity);
    let link_task = tokio::spawn(link.run(commands));

    let mut telemetry = if config.telemetry.enabled {
        Some(TelemetryRecorder::new(&config.telemetry)?)
    } else {
        None
    };

    let mut control = ControlLoop::new(
        ControlParams::from(&config.control),
        ActuatorSet::linked(queue),
    );

    let mut ticker = interval(config.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting control loop at {}Hz", config.control.tick_rate_hz);
    info!("Press Ctrl+C to exit");

    let mut held_ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = control.tick(&mut pad);
                if outcome == TickOutcome::Held {
                    held_ticks += 1;
                }

                if let Some(recorder) = telemetry.as_mut() {
                    let record = TickRecord::new(
                        control.ticks(),
                        outcome == TickOutcome::Applied,
                        *control.state(),
                    );
                    if let Err(e) = recorder.sample(Instant::now(), &record) {
                        warn!("Telemetry write failed, disabling telemetry: {}", e);
                        telemetry = None;
                    }
                }

                if control.ticks() % STATUS_LOG_INTERVAL_TICKS == 0 {
                    let state = control.state();
                    info!(
                        "Tick {}: gamepad {}, arms L{:.1} R{:.1} ({:?}), eyes L{:.1} R{:.1}, drive {}/{}",
                        control.ticks(),
                        if pad.is_connected() { "connected" } else { "disconnected" },
                        state.arms.left.target_angle,
                        state.arms.right.target_angle,
                        state.arms.active,
                        state.eyes.left.angle,
                        state.eyes.right.angle,
                        state.drive.left,
                        state.drive.right,
                    );
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total ticks: {} ({} without gamepad)", control.ticks(), held_ticks);
                break;
            }
        }
    }

    // Dropping the loop drops every sink, which closes the link queue
    drop(control);
    let stats = link_task.await.context("Actuator link task failed")?;
    info!(
        "Frames sent: {}, write errors: {} ({} timeouts)",
        stats.frames_sent, stats.write_errors, stats.timeouts
    );

    Ok(())
}

/// Load the configuration, falling back to defaults if the file is missing
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let config = Config::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_interval_constant() {
        assert_eq!(STATUS_LOG_INTERVAL_TICKS, 500);

        // At the default 50Hz, 500 ticks = 10 seconds
        let config = Config::default();
        let seconds = STATUS_LOG_INTERVAL_TICKS as f64 / config.control.tick_rate_hz as f64;
        assert_eq!(seconds, 10.0);
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/animatronic.toml")).unwrap();
        assert_eq!(config.control.tick_rate_hz, 50);
        assert_eq!(config.link.baud_rate, 115200);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[control]\ntick_rate_hz = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }
}
