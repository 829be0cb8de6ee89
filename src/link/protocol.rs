//! # Actuator Link Protocol Constants
//!
//! Frame layout shared with the actuator board:
//!
//! ```text
//! sync(1) | len(1) | type(1) | payload(N) | crc(1)
//! ```
//!
//! `len` counts type + payload + crc. The CRC covers len, type and payload.

/// Frame sync byte
pub const LINK_SYNC_BYTE: u8 = 0xA7;

/// Servo angle frame: channel u8, centidegrees u16 big-endian
pub const FRAMETYPE_SERVO_ANGLE: u8 = 0x21;

/// Stepper direction frame: channel u8, 0 = forward / 1 = reverse
pub const FRAMETYPE_STEP_DIRECTION: u8 = 0x22;

/// Stepper rate frame: channel u8, magnitude u16 big-endian
pub const FRAMETYPE_STEP_RATE: u8 = 0x23;

/// Payload sizes per frame type
pub const SERVO_ANGLE_PAYLOAD_SIZE: usize = 3;
pub const STEP_DIRECTION_PAYLOAD_SIZE: usize = 2;
pub const STEP_RATE_PAYLOAD_SIZE: usize = 3;

/// Highest angle a servo frame can carry, in centidegrees
pub const SERVO_MAX_CENTIDEGREES: u16 = 18_000;

/// Highest step-rate magnitude a rate frame can carry
pub const STEP_RATE_MAX: u16 = 512;

/// Bytes around the payload: sync + len + type + crc
pub const FRAME_OVERHEAD: usize = 4;

/// Value of the `len` byte for a payload of `payload_size` bytes
#[must_use]
pub const fn frame_length(payload_size: usize) -> u8 {
    (payload_size + 2) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_types_are_distinct() {
        assert_ne!(FRAMETYPE_SERVO_ANGLE, FRAMETYPE_STEP_DIRECTION);
        assert_ne!(FRAMETYPE_STEP_DIRECTION, FRAMETYPE_STEP_RATE);
        assert_ne!(FRAMETYPE_SERVO_ANGLE, FRAMETYPE_STEP_RATE);
    }

    #[test]
    fn test_frame_length() {
        // type + 3-byte payload + crc
        assert_eq!(frame_length(SERVO_ANGLE_PAYLOAD_SIZE), 5);
        assert_eq!(frame_length(STEP_DIRECTION_PAYLOAD_SIZE), 4);
    }
}
