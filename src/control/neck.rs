//! # Neck Axis
//!
//! The neck stepper only gets a direction, taken from the sign of the right
//! stick's vertical axis. Unlike the drive mixer there is no deadzone, so a
//! resting stick that reads slightly negative drives the neck in reverse.

use crate::actuator::Direction;

/// Direction for the neck stepper this tick.
///
/// # Examples
///
/// ```
/// use animatronic_bridge::actuator::Direction;
/// use animatronic_bridge::control::neck::neck_direction;
///
/// assert_eq!(neck_direction(0), Direction::Forward);
/// assert_eq!(neck_direction(-1), Direction::Reverse);
/// ```
#[must_use]
pub fn neck_direction(axis: i32) -> Direction {
    Direction::from_signed(axis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_only() {
        assert_eq!(neck_direction(512), Direction::Forward);
        assert_eq!(neck_direction(1), Direction::Forward);
        assert_eq!(neck_direction(-512), Direction::Reverse);
    }

    #[test]
    fn test_no_deadzone_near_center() {
        // Pins current behaviour: tiny deflections still flip direction,
        // where the drive mixer would have zeroed them
        assert_eq!(neck_direction(0), Direction::Forward);
        for v in -39..0 {
            assert_eq!(neck_direction(v), Direction::Reverse, "axis {}", v);
        }
        for v in 0..40 {
            assert_eq!(neck_direction(v), Direction::Forward, "axis {}", v);
        }
    }
}
