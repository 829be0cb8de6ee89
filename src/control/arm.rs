//! # Arm Lock State Machine
//!
//! Tracks which arm the triggers are steering and whether each arm is
//! parked.
//!
//! ## Transitions (evaluated in this order every connected tick)
//!
//! 1. Left trigger above the deadzone selects the left arm, then the right
//!    trigger selects the right arm. Right therefore wins a tie.
//! 2. A locks the selected arm (no-op with nothing selected).
//! 3. B unlocks both arms.
//! 4. Each unlocked arm whose trigger is above the deadzone takes the
//!    trigger's mapped angle. Locked arms hold.
//! 5. D-pad down re-centres both arms to 90°, overriding step 4.
//!
//! The selection is sticky: it only changes when the other trigger is
//! touched.

use serde::Serialize;

use crate::input::{Dpad, InputSnapshot, TRIGGER_MAX};

/// Lowest commanded arm angle in degrees.
pub const ARM_MIN_DEG: f32 = 20.0;
/// Highest commanded arm angle in degrees.
pub const ARM_MAX_DEG: f32 = 160.0;
/// Rest / re-centre angle in degrees.
pub const ARM_REST_DEG: f32 = 90.0;

/// Which arm the triggers currently steer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ActiveArm {
    #[default]
    None,
    Left,
    Right,
}

/// Physical side of an arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmSide {
    Left,
    Right,
}

/// Target angle and lock flag of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArmState {
    pub target_angle: f32,
    pub locked: bool,
}

impl Default for ArmState {
    fn default() -> Self {
        Self {
            target_angle: ARM_REST_DEG,
            locked: false,
        }
    }
}

/// Both arms plus the shared selector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Arms {
    pub left: ArmState,
    pub right: ArmState,
    pub active: ActiveArm,
}

/// Maps a trigger reading to an arm angle.
///
/// The left arm is mounted mirrored, so it runs 160° → 20° as the trigger
/// is pulled; the right arm runs 20° → 160°.
///
/// # Examples
///
/// ```
/// use animatronic_bridge::control::arm::{map_trigger, ArmSide};
///
/// assert_eq!(map_trigger(ArmSide::Left, 0), 160.0);
/// assert_eq!(map_trigger(ArmSide::Right, 0), 20.0);
/// assert_eq!(map_trigger(ArmSide::Right, 1023), 160.0);
/// ```
#[must_use]
pub fn map_trigger(side: ArmSide, value: i32) -> f32 {
    let t = value.clamp(0, TRIGGER_MAX) as f32 / TRIGGER_MAX as f32;
    let span = ARM_MAX_DEG - ARM_MIN_DEG;

    let angle = match side {
        ArmSide::Left => ARM_MAX_DEG - t * span,
        ArmSide::Right => ARM_MIN_DEG + t * span,
    };

    angle.clamp(ARM_MIN_DEG, ARM_MAX_DEG)
}

impl Arms {
    /// Runs one tick of the state machine against `input`.
    pub fn update(&mut self, input: &InputSnapshot, trigger_deadzone: i32) {
        let left_pulled = input.left_trigger > trigger_deadzone;
        let right_pulled = input.right_trigger > trigger_deadzone;

        if left_pulled {
            self.active = ActiveArm::Left;
        }
        if right_pulled {
            self.active = ActiveArm::Right;
        }

        if input.lock {
            self.lock_active();
        }
        if input.unlock {
            self.unlock_all();
        }

        if left_pulled && !self.left.locked {
            self.left.target_angle = map_trigger(ArmSide::Left, input.left_trigger);
        }
        if right_pulled && !self.right.locked {
            self.right.target_angle = map_trigger(ArmSide::Right, input.right_trigger);
        }

        // Runs after the trigger update and may override it
        if input.dpad.contains(Dpad::DOWN) {
            self.recenter();
        }
    }

    /// Locks whichever arm is selected.
    pub fn lock_active(&mut self) {
        match self.active {
            ActiveArm::Left => self.left.locked = true,
            ActiveArm::Right => self.right.locked = true,
            ActiveArm::None => {}
        }
    }

    /// Unlocks both arms regardless of selection.
    pub fn unlock_all(&mut self) {
        self.left.locked = false;
        self.right.locked = false;
    }

    /// Moves both arms to rest without touching the lock flags.
    pub fn recenter(&mut self) {
        self.left.target_angle = ARM_REST_DEG;
        self.right.target_angle = ARM_REST_DEG;
    }
}
