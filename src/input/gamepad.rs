//! # Gamepad Device Module
//!
//! Gamepad detection, connection and the blocking reader loop, using the
//! Linux evdev interface.
//!
//! ## Controller Detection
//!
//! If `input.device_path` is configured, that device is opened directly.
//! Otherwise all `/dev/input/event*` devices are scanned in sorted order
//! and the first one reporting both `BTN_SOUTH` and `ABS_X` is used. This
//! matches Xbox, DualSense and most generic pads.
//!
//! ## Reader Loop
//!
//! [`run_reader`] owns the device on a dedicated thread. It drives the
//! [`GamepadSlot`] hooks: connect when a device opens, publish after every
//! event batch, disconnect on a read error. It then waits
//! `reconnect_interval_ms` and scans again.
//!
//! Axis ranges come from the driver's absinfo when the pad opens, so an
//! 8-bit trigger still spans the full arm travel. The `[input]` ranges only
//! fill in axes the driver does not describe.

use evdev::{AbsoluteAxisType, Device, InputEvent, Key};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::handle::{GamepadSlot, PadId};
use super::mapper::{AxisRanges, EventMapper};
use crate::config::InputConfig;
use crate::error::{BridgeError, Result};

/// Directory scanned for event devices
const INPUT_DIR: &str = "/dev/input";

/// Open gamepad device
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

/// True if the device looks like a gamepad (face button and a stick)
fn is_gamepad(device: &Device) -> bool {
    let has_face_button = device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
    let has_stick = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));

    has_face_button && has_stick
}

impl Gamepad {
    /// Open the configured gamepad, or auto-detect one
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No gamepad found on the system
    /// - `Controller`: The configured device cannot be opened or `/dev/input`
    ///   cannot be read
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use animatronic_bridge::config::InputConfig;
    /// use animatronic_bridge::input::gamepad::Gamepad;
    ///
    /// let pad = Gamepad::open(&InputConfig::default())?;
    /// println!("Connected to gamepad at: {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &InputConfig) -> Result<Self> {
        if config.device_path.is_empty() {
            Self::detect(Path::new(INPUT_DIR))
        } else {
            Self::open_path(Path::new(&config.device_path))
        }
    }

    /// Open a specific event device without capability checks
    pub fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            BridgeError::Controller(format!("Failed to open {}: {}", path.display(), e))
        })?;

        Ok(Self {
            device,
            device_path: path.to_string_lossy().to_string(),
        })
    }

    /// Scan `dir` for the first device that looks like a gamepad
    pub fn detect(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            return Err(BridgeError::Controller(format!(
                "{} directory not found",
                dir.display()
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| {
                BridgeError::Controller(format!("Failed to read {}: {}", dir.display(), e))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BridgeError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic choice when several pads are plugged in
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let id = device.input_id();
                    debug!(
                        "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                        path.display(),
                        id.vendor(),
                        id.product()
                    );

                    if is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found gamepad {:?} at: {}",
                            device.name().unwrap_or("unknown"),
                            device_path
                        );
                        return Ok(Self {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied and the like, skip
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(BridgeError::ControllerNotFound)
    }

    /// Device path this gamepad was opened from
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name, if the driver reports one
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Axis ranges reported by the driver, with `fallback` for anything the
    /// device does not describe
    pub fn axis_ranges(&self, fallback: AxisRanges) -> AxisRanges {
        let supported = self.device.supported_absolute_axes();
        match self.device.get_abs_state() {
            Ok(state) => {
                let ranges = fallback.with_device_ranges(|axis| {
                    if !supported.map_or(false, |axes| axes.contains(axis)) {
                        return None;
                    }
                    let info = state.get(usize::from(axis.0))?;
                    Some((info.minimum, info.maximum))
                });
                debug!("Axis ranges for {}: {:?}", self.device_path, ranges);
                ranges
            }
            Err(e) => {
                debug!("No absinfo from {}, using configured ranges: {}", self.device_path, e);
                fallback
            }
        }
    }

    /// Fetch pending events; blocks until at least one is available
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the read fails (typically the pad went
    /// away).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| BridgeError::Controller(format!("Failed to fetch events: {}", e)))
    }
}

/// One source of evdev event batches, such as an open [`Gamepad`]
pub(crate) trait EventBatches {
    /// Block until the next batch is available
    fn next_batch(&mut self) -> Result<Vec<InputEvent>>;
}

impl EventBatches for Gamepad {
    fn next_batch(&mut self) -> Result<Vec<InputEvent>> {
        Ok(self.fetch_events()?.collect())
    }
}

/// Why [`pump_events`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReaderExit {
    /// The device failed; the slot was cleared
    Lost,
    /// The control side dropped its handle
    Closed,
}

/// Feed batches from `source` into `slot` until the device fails or the
/// control side goes away
pub(crate) fn pump_events<S: EventBatches + ?Sized>(
    source: &mut S,
    id: PadId,
    mapper: &mut EventMapper,
    slot: &GamepadSlot,
) -> ReaderExit {
    loop {
        match source.next_batch() {
            Ok(events) => {
                for event in &events {
                    mapper.process_event(event);
                }
                slot.publish(id, mapper.snapshot().clone());
            }
            Err(e) => {
                warn!("Lost gamepad {}: {}", id, e);
                slot.on_disconnect(id);
                return ReaderExit::Lost;
            }
        }

        if slot.is_closed() {
            return ReaderExit::Closed;
        }
    }
}

/// Blocking reader loop; run it on its own thread
///
/// Returns once the control side has dropped its
/// [`GamepadHandle`](super::handle::GamepadHandle).
pub fn run_reader(config: InputConfig, slot: GamepadSlot) {
    let fallback = AxisRanges::from(&config);
    let retry = Duration::from_millis(config.reconnect_interval_ms);

    while !slot.is_closed() {
        match Gamepad::open(&config) {
            Ok(mut pad) => {
                let mut mapper = EventMapper::new(pad.axis_ranges(fallback));
                let id = slot.on_connect();
                info!("Reading {} from {}", id, pad.device_path());

                if pump_events(&mut pad, id, &mut mapper, &slot) == ReaderExit::Closed {
                    return;
                }
            }
            Err(e) => debug!("No gamepad available: {}", e),
        }

        std::thread::sleep(retry);
    }
}

#[cfg(test)]
mod tests {
    use super::super::handle;
    use super::super::{InputSnapshot, InputSource};
    use super::*;
    use evdev::EventType;
    use std::collections::VecDeque;

    #[test]
    fn test_detect_missing_directory() {
        let result = Gamepad::detect(Path::new("/nonexistent/input"));
        match result {
            Err(BridgeError::Controller(msg)) => assert!(msg.contains("/nonexistent/input")),
            other => panic!("Expected Controller error, got: {:?}", other),
        }
    }

    #[test]
    fn test_detect_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = Gamepad::detect(dir.path());
        assert!(matches!(result, Err(BridgeError::ControllerNotFound)));
    }

    #[test]
    fn test_detect_skips_non_event_nodes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("js0"), b"").unwrap();
        std::fs::write(dir.path().join("mouse0"), b"").unwrap();
        let result = Gamepad::detect(dir.path());
        assert!(matches!(result, Err(BridgeError::ControllerNotFound)));
    }

    #[test]
    fn test_open_configured_path_missing() {
        let config = InputConfig {
            device_path: "/dev/input/event_missing_12345".to_string(),
            ..InputConfig::default()
        };
        match Gamepad::open(&config) {
            Err(BridgeError::Controller(msg)) => {
                assert!(msg.contains("event_missing_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Controller error, got: {:?}", other),
        }
    }

    #[test]
    fn test_reader_exits_when_handle_dropped() {
        let (slot, handle) = super::super::handle::channel();
        drop(handle);
        let config = InputConfig {
            device_path: "/dev/input/event_missing_12345".to_string(),
            reconnect_interval_ms: 1,
            ..InputConfig::default()
        };
        // Returns immediately instead of retrying forever
        run_reader(config, slot);
    }

    /// Plays back batches, then fails like an unplugged pad
    struct ScriptedDevice {
        batches: VecDeque<Vec<InputEvent>>,
        handle: handle::GamepadHandle,
        seen: Vec<Option<i32>>,
    }

    impl EventBatches for ScriptedDevice {
        fn next_batch(&mut self) -> Result<Vec<InputEvent>> {
            // What the control side sees after the previous batch
            self.seen.push(self.handle.snapshot().map(|s| s.left_trigger));
            self.batches
                .pop_front()
                .ok_or_else(|| BridgeError::Controller("Failed to fetch events: No such device".to_string()))
        }
    }

    fn trigger_batch(value: i32) -> Vec<InputEvent> {
        vec![
            InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_Z.0, value),
            InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
        ]
    }

    #[test]
    fn test_pump_publishes_batches_then_clears_on_read_error() {
        let (slot, mut control_side) = handle::channel();
        let id = slot.on_connect();
        let mut device = ScriptedDevice {
            batches: VecDeque::from(vec![trigger_batch(300), trigger_batch(700)]),
            handle: control_side.clone(),
            seen: Vec::new(),
        };
        let mut mapper = EventMapper::new(AxisRanges::default());

        let exit = pump_events(&mut device, id, &mut mapper, &slot);

        assert_eq!(exit, ReaderExit::Lost);
        assert_eq!(device.seen, vec![Some(0), Some(300), Some(700)]);
        assert!(!control_side.is_connected());
        assert!(control_side.poll().is_none());
    }

    #[test]
    fn test_pump_read_error_leaves_newer_pad_alone() {
        let (slot, control_side) = handle::channel();
        let old = slot.on_connect();
        let newer = slot.on_connect();
        slot.publish(newer, InputSnapshot { lock: true, ..Default::default() });

        let mut device = ScriptedDevice {
            batches: VecDeque::new(),
            handle: control_side.clone(),
            seen: Vec::new(),
        };
        let mut mapper = EventMapper::new(AxisRanges::default());

        assert_eq!(pump_events(&mut device, old, &mut mapper, &slot), ReaderExit::Lost);
        assert!(control_side.snapshot().unwrap().lock);
    }

    /// Plays back batches without holding a handle of its own
    struct DetachedDevice {
        batches: VecDeque<Vec<InputEvent>>,
    }

    impl EventBatches for DetachedDevice {
        fn next_batch(&mut self) -> Result<Vec<InputEvent>> {
            self.batches
                .pop_front()
                .ok_or_else(|| BridgeError::Controller("exhausted".to_string()))
        }
    }

    #[test]
    fn test_pump_stops_when_handle_dropped() {
        let (slot, control_side) = handle::channel();
        let id = slot.on_connect();
        drop(control_side);

        let mut device = DetachedDevice {
            batches: VecDeque::from(vec![trigger_batch(10), trigger_batch(20)]),
        };
        let mut mapper = EventMapper::new(AxisRanges::default());

        assert_eq!(pump_events(&mut device, id, &mut mapper, &slot), ReaderExit::Closed);
        assert_eq!(device.batches.len(), 1);
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let pad = Gamepad::open(&InputConfig::default()).expect("Gamepad not found");
        assert!(pad.device_path().starts_with("/dev/input/event"));
        assert!(pad.name().is_some());
    }
}
