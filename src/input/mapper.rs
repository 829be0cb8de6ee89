//! # Gamepad Event Mapper Module
//!
//! This module parses raw evdev events from the gamepad and folds them into
//! an [`InputSnapshot`] on the control loop's scale.
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Snapshot field |
//! |------|------------|----------------|
//! | Left Stick X | ABS_X | `drive_turn` |
//! | Left Stick Y | ABS_Y | `drive_forward` |
//! | Right Stick Y | ABS_RY | `neck_axis` |
//! | Left Trigger | ABS_Z / ABS_BRAKE | `left_trigger` |
//! | Right Trigger | ABS_RZ / ABS_GAS | `right_trigger` |
//! | D-Pad X | ABS_HAT0X | `dpad` LEFT / RIGHT |
//! | D-Pad Y | ABS_HAT0Y | `dpad` UP / DOWN |
//!
//! Wired pads report triggers on ABS_Z/ABS_RZ; Bluetooth pads often use
//! ABS_BRAKE/ABS_GAS instead. Both are accepted.
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code | Snapshot field |
//! |--------|------------|----------------|
//! | A | BTN_SOUTH | `lock` |
//! | B | BTN_EAST | `unlock` |
//! | L1 | BTN_TL | `look_left` |
//! | R1 | BTN_TR | `look_right` |
//! | D-Pad | BTN_DPAD_UP / DOWN / LEFT / RIGHT | `dpad` |
//!
//! Most pads report the d-pad as a hat; some (and some kernel drivers)
//! report it as four keys. Both are accepted.
//!
//! ## Scaling
//!
//! Sticks are rescaled from the device range to `[-512, 512]` around its
//! midpoint; triggers from `[0, trigger_max]` to `[0, 1023]`. The ranges
//! come from the device's absinfo where it reports one, see
//! [`AxisRanges::with_device_ranges`].

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};

use super::{Dpad, InputSnapshot, STICK_MAX, TRIGGER_MAX};
use crate::config::InputConfig;

/// Raw device ranges used for normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRanges {
    pub stick_min: i32,
    pub stick_max: i32,
    pub trigger_max: i32,
}

impl Default for AxisRanges {
    /// Xbox-style ranges: 16-bit signed sticks, 10-bit triggers.
    fn default() -> Self {
        Self {
            stick_min: -32768,
            stick_max: 32767,
            trigger_max: 1023,
        }
    }
}

impl From<&InputConfig> for AxisRanges {
    fn from(config: &InputConfig) -> Self {
        Self {
            stick_min: config.stick_min,
            stick_max: config.stick_max,
            trigger_max: config.trigger_max,
        }
    }
}

impl AxisRanges {
    /// Replaces ranges with what the device reports
    ///
    /// `lookup` returns `(minimum, maximum)` for axes the device has. The
    /// left stick X range stands in for all sticks and the left trigger
    /// (`ABS_Z`, else `ABS_BRAKE`) for both triggers. Degenerate ranges
    /// are ignored and `self` is kept for them.
    ///
    /// # Examples
    ///
    /// ```
    /// use animatronic_bridge::input::mapper::AxisRanges;
    /// use evdev::AbsoluteAxisType;
    ///
    /// // Wired xpad: 16-bit sticks, 8-bit triggers
    /// let ranges = AxisRanges::default().with_device_ranges(|axis| match axis {
    ///     AbsoluteAxisType::ABS_X => Some((-32768, 32767)),
    ///     AbsoluteAxisType::ABS_Z => Some((0, 255)),
    ///     _ => None,
    /// });
    /// assert_eq!(ranges.trigger_max, 255);
    /// assert_eq!(ranges.scale_trigger(255), 1023);
    /// ```
    #[must_use]
    pub fn with_device_ranges<F>(self, lookup: F) -> Self
    where
        F: Fn(AbsoluteAxisType) -> Option<(i32, i32)>,
    {
        let mut ranges = self;

        if let Some((min, max)) = lookup(AbsoluteAxisType::ABS_X).filter(|(min, max)| min < max) {
            ranges.stick_min = min;
            ranges.stick_max = max;
        }

        let trigger = lookup(AbsoluteAxisType::ABS_Z).or_else(|| lookup(AbsoluteAxisType::ABS_BRAKE));
        if let Some((_, max)) = trigger.filter(|(_, max)| *max > 0) {
            ranges.trigger_max = max;
        }

        ranges
    }

    /// Rescales a raw stick reading to `[-512, 512]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use animatronic_bridge::input::mapper::AxisRanges;
    ///
    /// let ranges = AxisRanges { stick_min: 0, stick_max: 255, trigger_max: 255 };
    /// assert_eq!(ranges.scale_stick(0), -512);
    /// assert_eq!(ranges.scale_stick(255), 512);
    /// ```
    #[must_use]
    pub fn scale_stick(&self, raw: i32) -> i32 {
        let min = i64::from(self.stick_min);
        let max = i64::from(self.stick_max);
        let raw = i64::from(raw).clamp(min, max);

        // Twice the offset from the midpoint, over the full span
        let scaled = (2 * raw - min - max) * i64::from(STICK_MAX) / (max - min);
        scaled as i32
    }

    /// Rescales a raw trigger reading to `[0, 1023]`.
    #[must_use]
    pub fn scale_trigger(&self, raw: i32) -> i32 {
        let max = i64::from(self.trigger_max);
        let raw = i64::from(raw).clamp(0, max);
        (raw * i64::from(TRIGGER_MAX) / max) as i32
    }
}

/// Parses raw evdev events and maintains the current [`InputSnapshot`].
///
/// `EventMapper` is not thread-safe. Use from the reader thread only.
///
/// # Examples
///
/// ```
/// use animatronic_bridge::input::mapper::{AxisRanges, EventMapper};
///
/// let mapper = EventMapper::new(AxisRanges::default());
/// assert_eq!(mapper.snapshot().left_trigger, 0);
/// ```
#[derive(Debug)]
pub struct EventMapper {
    ranges: AxisRanges,
    snapshot: InputSnapshot,
}

impl EventMapper {
    #[must_use]
    pub fn new(ranges: AxisRanges) -> Self {
        Self {
            ranges,
            snapshot: InputSnapshot::default(),
        }
    }

    /// Returns a reference to the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &InputSnapshot {
        &self.snapshot
    }

    /// Processes a single evdev input event.
    ///
    /// Returns true for `SYN_REPORT`, which marks the end of a coherent
    /// batch of changes.
    pub fn process_event(&mut self, event: &InputEvent) -> bool {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
                false
            }
            InputEventKind::Key(key) => {
                self.process_key_event(key, event.value() != 0);
                false
            }
            InputEventKind::Synchronization(sync) => sync == evdev::Synchronization::SYN_REPORT,
            _ => false,
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        match axis {
            AbsoluteAxisType::ABS_X => self.snapshot.drive_turn = self.ranges.scale_stick(value),
            AbsoluteAxisType::ABS_Y => self.snapshot.drive_forward = self.ranges.scale_stick(value),
            AbsoluteAxisType::ABS_RY => self.snapshot.neck_axis = self.ranges.scale_stick(value),

            AbsoluteAxisType::ABS_Z | AbsoluteAxisType::ABS_BRAKE => {
                self.snapshot.left_trigger = self.ranges.scale_trigger(value)
            }
            AbsoluteAxisType::ABS_RZ | AbsoluteAxisType::ABS_GAS => {
                self.snapshot.right_trigger = self.ranges.scale_trigger(value)
            }

            AbsoluteAxisType::ABS_HAT0X => {
                self.snapshot.dpad.set(Dpad::LEFT, value < 0);
                self.snapshot.dpad.set(Dpad::RIGHT, value > 0);
            }
            AbsoluteAxisType::ABS_HAT0Y => {
                self.snapshot.dpad.set(Dpad::UP, value < 0);
                self.snapshot.dpad.set(Dpad::DOWN, value > 0);
            }

            _ => {
                // Right stick X, gyro and the like are unused
            }
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        match key {
            Key::BTN_SOUTH => self.snapshot.lock = pressed,
            Key::BTN_EAST => self.snapshot.unlock = pressed,
            Key::BTN_TL => self.snapshot.look_left = pressed,
            Key::BTN_TR => self.snapshot.look_right = pressed,
            Key::BTN_DPAD_UP => self.snapshot.dpad.set(Dpad::UP, pressed),
            Key::BTN_DPAD_DOWN => self.snapshot.dpad.set(Dpad::DOWN, pressed),
            Key::BTN_DPAD_LEFT => self.snapshot.dpad.set(Dpad::LEFT, pressed),
            Key::BTN_DPAD_RIGHT => self.snapshot.dpad.set(Dpad::RIGHT, pressed),
            _ => {}
        }
    }

    /// Returns to a neutral snapshot (e.g. after reconnecting).
    pub fn reset(&mut self) {
        self.snapshot = InputSnapshot::default();
    }
}
