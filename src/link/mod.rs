//! # Actuator Link Module
//!
//! Serial connection to the board that physically drives the servos and
//! stepper motors.
//!
//! This module handles:
//! - Opening the serial port (8N1) at the configured baud rate
//! - Encoding queued [`ActuatorCommand`]s into CRC-checked frames
//! - Writing them in batches from a dedicated task, each batch bounded by
//!   `link.timeout_ms`
//!
//! Write failures and stalls are logged and counted. They are never
//! reported back to the control loop. The queue feeding the writer is
//! bounded, so a wedged port costs dropped commands rather than memory.

pub mod crc;
pub mod encoder;
pub mod port_trait;
pub mod protocol;

use std::time::Duration;

use bytes::BytesMut;
use tokio::sync::mpsc::Receiver;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, trace, warn};

use crate::actuator::ActuatorCommand;
use crate::config::LinkConfig;
use crate::error::{BridgeError, Result};
use encoder::encode_command;
use port_trait::{SerialPortIO, TokioSerialPort};

/// Fallback device paths tried after the configured one
const FALLBACK_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (CH340, CP210x)
    "/dev/ttyACM0", // USB CDC boards
];

/// Write timeout used until one is configured
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Running totals for the link writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub frames_sent: u64,
    pub batches_sent: u64,
    /// Failed batches, timeouts included
    pub write_errors: u64,
    pub timeouts: u64,
}

/// Serial actuator link
pub struct ActuatorLink<P: SerialPortIO = TokioSerialPort> {
    port: P,
    device_path: String,
    write_timeout: Duration,
    stats: LinkStats,
}

impl<P: SerialPortIO> std::fmt::Debug for ActuatorLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorLink")
            .field("device_path", &self.device_path)
            .field("write_timeout", &self.write_timeout)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ActuatorLink<TokioSerialPort> {
    /// Open the configured port, falling back to common device paths
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried if none opens.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use animatronic_bridge::config::LinkConfig;
    /// use animatronic_bridge::link::ActuatorLink;
    ///
    /// let link = ActuatorLink::open(&LinkConfig::default())?;
    /// println!("Actuator board at: {}", link.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &LinkConfig) -> Result<Self> {
        let mut paths = vec![config.port.as_str()];
        paths.extend(
            FALLBACK_DEVICE_PATHS
                .iter()
                .copied()
                .filter(|path| *path != config.port),
        );
        let link = Self::open_with_paths(&paths, config.baud_rate)?;
        Ok(link.with_write_timeout(Duration::from_millis(config.timeout_ms)))
    }

    /// Try each path in order and keep the first that opens
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open actuator link: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened actuator link at {} ({} baud)", path, baud_rate);
                    return Ok(Self::with_port(TokioSerialPort::new(port), path));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                }
            }
        }

        Err(BridgeError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::Serial(format!("Failed to open {}: {}", path, e)))
    }
}

impl<P: SerialPortIO> ActuatorLink<P> {
    /// Wrap an already-open port
    pub fn with_port(port: P, device_path: &str) -> Self {
        Self {
            port,
            device_path: device_path.to_string(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            stats: LinkStats::default(),
        }
    }

    /// Bound each batched write plus flush by `timeout`
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Encode and write a batch of commands with a single flush
    ///
    /// # Errors
    ///
    /// Returns `Serial` error if the write or flush fails or does not
    /// finish within the write timeout.
    pub async fn send_commands(&mut self, commands: &[ActuatorCommand]) -> Result<()> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut buffer = BytesMut::new();
        for command in commands {
            buffer.extend_from_slice(&encode_command(command));
        }

        if let Err(e) = self.port.write_batch_within(&buffer, self.write_timeout).await {
            if e.kind() == std::io::ErrorKind::TimedOut {
                self.stats.timeouts += 1;
            }
            return Err(BridgeError::Serial(format!("Failed to write frames: {}", e)));
        }

        self.stats.frames_sent += commands.len() as u64;
        self.stats.batches_sent += 1;
        trace!("Sent {} frames ({} bytes)", commands.len(), buffer.len());
        Ok(())
    }

    /// Writer loop: drain the command queue until every sender is gone
    ///
    /// Commands already queued when the task wakes are written together.
    pub async fn run(mut self, mut queue: Receiver<ActuatorCommand>) -> LinkStats {
        let mut batch = Vec::new();

        while let Some(first) = queue.recv().await {
            batch.clear();
            batch.push(first);
            while let Ok(next) = queue.try_recv() {
                batch.push(next);
            }

            if let Err(e) = self.send_commands(&batch).await {
                self.stats.write_errors += 1;
                warn!("Actuator link write failed on {}: {}", self.device_path, e);
            }
        }

        info!(
            "Actuator link closed: {} frames in {} batches, {} write errors ({} timeouts)",
            self.stats.frames_sent,
            self.stats.batches_sent,
            self.stats.write_errors,
            self.stats.timeouts
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::port_trait::mocks::MockSerialPort;
    use super::protocol::*;
    use super::*;
    use crate::actuator::{ActuatorChannel, Direction};
    use crate::actuator::ActuatorSet;
    use crate::control::{ControlLoop, ControlParams};
    use crate::input::{InputSnapshot, ScriptedInput};
    use tokio::sync::mpsc;
    use tokio_test::{assert_err, assert_ok, block_on};

    fn angle(channel: ActuatorChannel, degrees: f32) -> ActuatorCommand {
        ActuatorCommand::Angle { channel, degrees }
    }

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let result = ActuatorLink::open_with_paths(&["/dev/nonexistent0", "/dev/nonexistent1"], 115200);
        match result {
            Err(BridgeError::SerialPortNotFound(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let result = ActuatorLink::open_with_paths(&[], 115200);
        assert!(matches!(result, Err(BridgeError::SerialPortNotFound(_))));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        match ActuatorLink::open_port("/dev/nonexistent_serial_device_12345", 115200) {
            Err(BridgeError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_commands_writes_one_batch() {
        let port = MockSerialPort::new();
        let mut link = ActuatorLink::with_port(port.clone(), "mock");

        let commands = [
            angle(ActuatorChannel::ArmLeft, 90.0),
            ActuatorCommand::Direction {
                channel: ActuatorChannel::Neck,
                direction: Direction::Reverse,
            },
        ];
        assert_ok!(link.send_commands(&commands).await);

        let written = port.batches();
        assert_eq!(written.len(), 1);
        assert_eq!(
            written[0].len(),
            SERVO_ANGLE_PAYLOAD_SIZE + STEP_DIRECTION_PAYLOAD_SIZE + 2 * FRAME_OVERHEAD
        );
        assert_eq!(written[0][0], LINK_SYNC_BYTE);
        assert_eq!(link.stats().frames_sent, 2);
    }

    #[test]
    fn test_send_empty_batch_is_noop() {
        let port = MockSerialPort::new();
        let mut link = ActuatorLink::with_port(port.clone(), "mock");
        assert_ok!(block_on(link.send_commands(&[])));
        assert!(port.batches().is_empty());
    }

    #[tokio::test]
    async fn test_send_reports_write_error() {
        let port = MockSerialPort::new();
        port.fail_writes(Some(std::io::ErrorKind::BrokenPipe));
        let mut link = ActuatorLink::with_port(port, "mock");

        let err = assert_err!(link.send_commands(&[angle(ActuatorChannel::EyeLeft, 40.0)]).await);
        assert!(matches!(err, BridgeError::Serial(_)));
        assert_eq!(link.stats().frames_sent, 0);
    }

    #[tokio::test]
    async fn test_run_drains_queue_until_closed() {
        let port = MockSerialPort::new();
        let link = ActuatorLink::with_port(port.clone(), "mock");
        let (tx, rx) = mpsc::channel(16);

        for channel in ActuatorChannel::ALL {
            tx.try_send(angle(channel, 90.0)).unwrap();
        }
        drop(tx);

        let stats = link.run(rx).await;
        assert_eq!(stats.frames_sent, 7);
        assert_eq!(stats.batches_sent, 1);
        assert_eq!(stats.write_errors, 0);

        let bytes: usize = port.batches().iter().map(Vec::len).sum();
        assert_eq!(bytes, 7 * (SERVO_ANGLE_PAYLOAD_SIZE + FRAME_OVERHEAD));
    }

    #[tokio::test]
    async fn test_run_counts_errors_and_keeps_going() {
        let port = MockSerialPort::new();
        port.fail_writes(Some(std::io::ErrorKind::BrokenPipe));
        let link = ActuatorLink::with_port(port.clone(), "mock");
        let (tx, rx) = mpsc::channel(16);

        tx.try_send(angle(ActuatorChannel::ArmRight, 20.0)).unwrap();
        drop(tx);

        let stats = link.run(rx).await;
        assert_eq!(stats.write_errors, 1);
        assert_eq!(stats.timeouts, 0);
        assert_eq!(stats.frames_sent, 0);
    }

    #[tokio::test]
    async fn test_send_times_out_on_stalled_port() {
        let port = MockSerialPort::new();
        port.stall();
        let mut link =
            ActuatorLink::with_port(port.clone(), "mock").with_write_timeout(Duration::from_millis(10));

        let err = assert_err!(link.send_commands(&[angle(ActuatorChannel::EyeRight, 90.0)]).await);
        match err {
            BridgeError::Serial(msg) => assert!(msg.contains("stalled")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
        assert_eq!(link.stats().timeouts, 1);
        assert!(port.batches().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_port_neither_hangs_nor_backlogs() {
        let port = MockSerialPort::new();
        port.stall();
        let link = ActuatorLink::with_port(port, "mock").with_write_timeout(Duration::from_millis(10));
        let (tx, rx) = mpsc::channel(64);
        let writer = tokio::spawn(link.run(rx));

        let mut control = ControlLoop::new(ControlParams::default(), ActuatorSet::linked(tx));
        let mut input = ScriptedInput::new(std::iter::repeat(Some(InputSnapshot::default())).take(5000));
        for _ in 0..5000 {
            control.tick(&mut input);
        }
        drop(control);

        let stats = tokio::time::timeout(Duration::from_secs(5), writer)
            .await
            .expect("writer hung on a stalled port")
            .unwrap();
        assert!(stats.timeouts >= 1);
        assert_eq!(stats.write_errors, stats.timeouts);
        assert_eq!(stats.frames_sent, 0);
    }

    #[test]
    fn test_default_write_timeout() {
        let link = ActuatorLink::with_port(MockSerialPort::new(), "mock");
        assert_eq!(link.write_timeout(), DEFAULT_WRITE_TIMEOUT);
        assert_eq!(
            DEFAULT_WRITE_TIMEOUT,
            Duration::from_millis(LinkConfig::default().timeout_ms)
        );
    }

    #[test]
    fn test_fallback_paths() {
        assert_eq!(FALLBACK_DEVICE_PATHS, &["/dev/ttyUSB0", "/dev/ttyACM0"]);
    }

    // Integration test - only runs if the actuator board is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_send_with_real_hardware() {
        if let Ok(mut link) = ActuatorLink::open(&LinkConfig::default()) {
            let result = link.send_commands(&[angle(ActuatorChannel::ArmLeft, 90.0)]).await;
            assert!(result.is_ok(), "Failed to send: {:?}", result);
        } else {
            println!("No actuator board detected (skipping send test)");
        }
    }
}
