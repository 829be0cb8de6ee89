//! # Input Module
//!
//! Gamepad input as seen by the control loop.
//!
//! This module handles:
//! - The per-tick [`InputSnapshot`] of triggers, sticks, buttons and d-pad
//! - The [`InputSource`] capability the control loop reads through
//! - Connect/disconnect bookkeeping ([`handle`])
//! - evdev gamepad detection and event normalisation ([`gamepad`], [`mapper`])

pub mod gamepad;
pub mod handle;
pub mod mapper;

use serde::Serialize;

/// Trigger range after normalisation.
pub const TRIGGER_MAX: i32 = 1023;

/// Stick range after normalisation (symmetric around 0).
pub const STICK_MAX: i32 = 512;

/// Directional pad bitmask.
///
/// # Examples
///
/// ```
/// use animatronic_bridge::input::Dpad;
///
/// let dpad = Dpad::UP | Dpad::LEFT;
/// assert!(dpad.contains(Dpad::UP));
/// assert!(!dpad.contains(Dpad::DOWN));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Dpad(u8);

impl Dpad {
    pub const NONE: Dpad = Dpad(0);
    pub const UP: Dpad = Dpad(0x01);
    pub const DOWN: Dpad = Dpad(0x02);
    pub const RIGHT: Dpad = Dpad(0x04);
    pub const LEFT: Dpad = Dpad(0x08);

    /// Raw bitmask.
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Dpad) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets or clears the bits of `other`.
    pub fn set(&mut self, other: Dpad, pressed: bool) {
        if pressed {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for Dpad {
    type Output = Dpad;

    fn bitor(self, rhs: Dpad) -> Dpad {
        Dpad(self.0 | rhs.0)
    }
}

/// Snapshot of every gamepad input the control loop consumes.
///
/// Triggers are in `[0, 1023]`; stick axes are signed, nominally
/// `[-512, 512]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InputSnapshot {
    /// Left analog trigger (selects and positions the left arm).
    pub left_trigger: i32,
    /// Right analog trigger (selects and positions the right arm).
    pub right_trigger: i32,

    /// Left stick vertical axis (drive forward/back).
    pub drive_forward: i32,
    /// Left stick horizontal axis (drive turn).
    pub drive_turn: i32,
    /// Right stick vertical axis (neck).
    pub neck_axis: i32,

    /// A button: lock the active arm.
    pub lock: bool,
    /// B button: unlock both arms.
    pub unlock: bool,
    /// L1: move the left eye.
    pub look_left: bool,
    /// R1: move the right eye.
    pub look_right: bool,

    pub dpad: Dpad,
}

/// A source of per-tick input.
///
/// `None` means no controller is connected this tick.
pub trait InputSource {
    fn poll(&mut self) -> Option<InputSnapshot>;
}

/// Plays back a fixed sequence of ticks, then reports disconnected.
///
/// Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    ticks: std::collections::VecDeque<Option<InputSnapshot>>,
}

impl ScriptedInput {
    pub fn new<I>(ticks: I) -> Self
    where
        I: IntoIterator<Item = Option<InputSnapshot>>,
    {
        Self {
            ticks: ticks.into_iter().collect(),
        }
    }

    /// Ticks not yet consumed.
    pub fn remaining(&self) -> usize {
        self.ticks.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Option<InputSnapshot> {
        self.ticks.pop_front().flatten()
    }
}
