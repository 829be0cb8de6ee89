//! # Actuator Frame Encoder
//!
//! Encodes [`ActuatorCommand`]s into link frames.

use bytes::{BufMut, Bytes, BytesMut};

use super::crc::crc8_dvb_s2;
use super::protocol::*;
use crate::actuator::{ActuatorCommand, Direction};

/// Degrees to centidegrees, clamped to what a servo frame can carry
///
/// Non-finite input maps to 0.
#[must_use]
pub fn angle_to_centidegrees(degrees: f32) -> u16 {
    if !degrees.is_finite() {
        return 0;
    }
    let centi = (degrees * 100.0).round();
    centi.clamp(0.0, f32::from(SERVO_MAX_CENTIDEGREES)) as u16
}

/// Encode one command into a complete frame
///
/// # Examples
///
/// ```
/// use animatronic_bridge::actuator::{ActuatorChannel, ActuatorCommand};
/// use animatronic_bridge::link::encoder::encode_command;
///
/// let frame = encode_command(&ActuatorCommand::Angle {
///     channel: ActuatorChannel::ArmLeft,
///     degrees: 90.0,
/// });
/// assert_eq!(&frame[..6], &[0xA7, 0x05, 0x21, 0x00, 0x23, 0x28]);
/// assert_eq!(frame.len(), 7);
/// ```
#[must_use]
pub fn encode_command(command: &ActuatorCommand) -> Bytes {
    let mut payload = BytesMut::with_capacity(3);

    let frame_type = match *command {
        ActuatorCommand::Angle { channel, degrees } => {
            payload.put_u8(channel.id());
            payload.put_u16(angle_to_centidegrees(degrees));
            FRAMETYPE_SERVO_ANGLE
        }
        ActuatorCommand::Direction { channel, direction } => {
            payload.put_u8(channel.id());
            payload.put_u8(match direction {
                Direction::Forward => 0,
                Direction::Reverse => 1,
            });
            FRAMETYPE_STEP_DIRECTION
        }
        ActuatorCommand::StepRate { channel, magnitude } => {
            payload.put_u8(channel.id());
            payload.put_u16(magnitude.min(STEP_RATE_MAX));
            FRAMETYPE_STEP_RATE
        }
    };

    encode_frame(frame_type, &payload)
}

/// Wrap a payload in sync, length, type and CRC
#[must_use]
pub fn encode_frame(frame_type: u8, payload: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(payload.len() + FRAME_OVERHEAD);
    frame.put_u8(LINK_SYNC_BYTE);
    frame.put_u8(frame_length(payload.len()));
    frame.put_u8(frame_type);
    frame.put_slice(payload);

    // CRC over len + type + payload
    let crc = crc8_dvb_s2(&frame[1..]);
    frame.put_u8(crc);

    frame.freeze()
}
