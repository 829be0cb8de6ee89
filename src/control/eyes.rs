//! # Eye Integrator
//!
//! Rate control for the two eye servos: holding L1 walks the left eye down
//! by a fixed step per tick, holding R1 walks the right eye up. Both stay
//! inside `[40°, 140°]`. D-pad up re-centres both eyes and takes priority
//! over any stepping in the same tick.

use serde::Serialize;

use crate::input::{Dpad, InputSnapshot};

pub const EYE_MIN_DEG: f32 = 40.0;
pub const EYE_MAX_DEG: f32 = 140.0;
pub const EYE_REST_DEG: f32 = 90.0;

/// Default per-tick step in degrees.
pub const EYE_STEP_DEG: f32 = 1.8;

/// Angle of one eye.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EyeState {
    pub angle: f32,
}

impl Default for EyeState {
    fn default() -> Self {
        Self {
            angle: EYE_REST_DEG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Eyes {
    pub left: EyeState,
    pub right: EyeState,
}

impl Eyes {
    /// Runs one tick of the integrator against `input`.
    pub fn update(&mut self, input: &InputSnapshot, step: f32) {
        if input.look_left {
            self.left.angle -= step;
        }
        if input.look_right {
            self.right.angle += step;
        }

        // Clamp every tick, held or not
        self.left.angle = self.left.angle.clamp(EYE_MIN_DEG, EYE_MAX_DEG);
        self.right.angle = self.right.angle.clamp(EYE_MIN_DEG, EYE_MAX_DEG);

        if input.dpad.contains(Dpad::UP) {
            self.recenter();
        }
    }

    pub fn recenter(&mut self) {
        self.left.angle = EYE_REST_DEG;
        self.right.angle = EYE_REST_DEG;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(look_left: bool, look_right: bool) -> InputSnapshot {
        InputSnapshot {
            look_left,
            look_right,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_step() {
        let mut eyes = Eyes::default();
        eyes.update(&holding(true, true), EYE_STEP_DEG);
        assert!((eyes.left.angle - 88.2).abs() < 1e-4);
        assert!((eyes.right.angle - 91.8).abs() < 1e-4);
    }

    #[test]
    fn test_idle_tick_leaves_angles() {
        let mut eyes = Eyes::default();
        eyes.update(&holding(true, false), EYE_STEP_DEG);
        let before = eyes;
        eyes.update(&InputSnapshot::default(), EYE_STEP_DEG);
        assert_eq!(eyes, before);
    }

    #[test]
    fn test_held_button_accumulates() {
        let mut eyes = Eyes::default();
        for _ in 0..10 {
            eyes.update(&holding(true, false), EYE_STEP_DEG);
        }
        assert!((eyes.left.angle - 72.0).abs() < 1e-3);
        assert_eq!(eyes.right.angle, 90.0);
    }

    #[test]
    fn test_never_leaves_bounds() {
        let mut eyes = Eyes::default();
        for _ in 0..1000 {
            eyes.update(&holding(true, true), EYE_STEP_DEG);
            assert!((EYE_MIN_DEG..=EYE_MAX_DEG).contains(&eyes.left.angle));
            assert!((EYE_MIN_DEG..=EYE_MAX_DEG).contains(&eyes.right.angle));
        }
        assert_eq!(eyes.left.angle, EYE_MIN_DEG);
        assert_eq!(eyes.right.angle, EYE_MAX_DEG);
    }

    #[test]
    fn test_clamp_repairs_out_of_range_state() {
        let mut eyes = Eyes {
            left: EyeState { angle: 10.0 },
            right: EyeState { angle: 170.0 },
        };
        eyes.update(&InputSnapshot::default(), EYE_STEP_DEG);
        assert_eq!(eyes.left.angle, EYE_MIN_DEG);
        assert_eq!(eyes.right.angle, EYE_MAX_DEG);
    }

    #[test]
    fn test_dpad_up_overrides_step() {
        let mut eyes = Eyes::default();
        for _ in 0..5 {
            eyes.update(&holding(true, true), EYE_STEP_DEG);
        }

        let input = InputSnapshot {
            look_left: true,
            look_right: true,
            dpad: Dpad::UP,
            ..Default::default()
        };
        eyes.update(&input, EYE_STEP_DEG);
        assert_eq!(eyes.left.angle, 90.0);
        assert_eq!(eyes.right.angle, 90.0);
    }

    #[test]
    fn test_custom_step() {
        let mut eyes = Eyes::default();
        eyes.update(&holding(false, true), 5.0);
        assert_eq!(eyes.right.angle, 95.0);
    }
}
