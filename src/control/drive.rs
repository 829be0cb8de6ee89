//! # Differential Drive Mixer
//!
//! Turns the left stick into two signed wheel commands.
//!
//! ```text
//! raw_left  = forward + turn
//! raw_right = forward - turn        (each clamped to [-512, 512])
//!
//! DriveCommand.left  = raw_right    (motors are mounted cross-wired)
//! DriveCommand.right = raw_left
//! ```
//!
//! Each axis below the deadzone (absolute value) is zeroed before mixing.
//! The sign of each command is the motor's direction; converting the
//! magnitude to a step rate is the sink's job.

use serde::Serialize;

use crate::actuator::Direction;

/// Saturation bound of each mixed command.
pub const DRIVE_LIMIT: i32 = 512;

/// Default stick deadzone in raw stick units.
pub const DRIVE_DEADZONE: i32 = 40;

/// Signed per-wheel command, already cross-wired to the physical motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DriveCommand {
    /// Physical left motor.
    pub left: i32,
    /// Physical right motor.
    pub right: i32,
}

impl DriveCommand {
    #[must_use]
    pub fn left_direction(&self) -> Direction {
        Direction::from_signed(self.left)
    }

    #[must_use]
    pub fn right_direction(&self) -> Direction {
        Direction::from_signed(self.right)
    }

    /// Unsigned magnitude of the left motor command.
    #[must_use]
    pub fn left_rate(&self) -> u16 {
        self.left.unsigned_abs() as u16
    }

    /// Unsigned magnitude of the right motor command.
    #[must_use]
    pub fn right_rate(&self) -> u16 {
        self.right.unsigned_abs() as u16
    }
}

/// Zeroes readings whose magnitude is below `deadzone`.
#[inline]
#[must_use]
pub fn apply_deadzone(value: i32, deadzone: i32) -> i32 {
    if value.saturating_abs() < deadzone {
        0
    } else {
        value
    }
}

/// Mixes stick axes into a cross-wired [`DriveCommand`].
///
/// # Examples
///
/// ```
/// use animatronic_bridge::control::drive::mix;
///
/// // Straight ahead
/// let cmd = mix(300, 0, 40);
/// assert_eq!((cmd.left, cmd.right), (300, 300));
///
/// // Stick noise is ignored
/// assert_eq!(mix(39, -39, 40), Default::default());
/// ```
#[must_use]
pub fn mix(forward: i32, turn: i32, deadzone: i32) -> DriveCommand {
    let forward = apply_deadzone(forward, deadzone);
    let turn = apply_deadzone(turn, deadzone);

    let raw_left = forward.saturating_add(turn).clamp(-DRIVE_LIMIT, DRIVE_LIMIT);
    let raw_right = forward.saturating_sub(turn).clamp(-DRIVE_LIMIT, DRIVE_LIMIT);

    DriveCommand {
        left: raw_right,
        right: raw_left,
    }
}
