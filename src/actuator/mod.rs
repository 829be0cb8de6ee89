//! # Actuator Module
//!
//! The two sink capabilities the control loop drives, and the wiring of
//! sinks to the serial actuator link.
//!
//! - [`AngleActuator`]: a servo that accepts a bounded angle.
//! - [`DirectionalStepSink`]: a stepper driver that accepts a direction and,
//!   optionally, a step-rate magnitude.
//!
//! Both are fire-and-forget. The core has no way to learn whether the
//! hardware obeyed and never waits on it.

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tracing::{debug, trace};

/// Stepper rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// `Forward` for zero and positive values, `Reverse` otherwise.
    #[must_use]
    pub fn from_signed(value: i32) -> Self {
        if value >= 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// Level of the driver's DIR line: LOW for forward, HIGH for reverse.
    #[must_use]
    pub fn is_high_level(self) -> bool {
        self == Direction::Reverse
    }
}

/// A servo taking an angle in degrees.
#[cfg_attr(test, mockall::automock)]
pub trait AngleActuator: Send {
    fn set_angle(&mut self, degrees: f32);
}

/// A stepper driver taking a direction.
#[cfg_attr(test, mockall::automock)]
pub trait DirectionalStepSink: Send {
    fn set_direction(&mut self, direction: Direction);

    /// Commanded magnitude (0..=512); the sink owns the conversion to a
    /// pulse frequency. Sinks without rate control ignore it.
    fn set_step_rate(&mut self, magnitude: u16) {
        let _ = magnitude;
    }
}

/// Physical actuator channels, numbered as on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActuatorChannel {
    ArmLeft = 0,
    ArmRight = 1,
    EyeLeft = 2,
    EyeRight = 3,
    DriveLeft = 4,
    DriveRight = 5,
    Neck = 6,
}

impl ActuatorChannel {
    pub const ALL: [ActuatorChannel; 7] = [
        ActuatorChannel::ArmLeft,
        ActuatorChannel::ArmRight,
        ActuatorChannel::EyeLeft,
        ActuatorChannel::EyeRight,
        ActuatorChannel::DriveLeft,
        ActuatorChannel::DriveRight,
        ActuatorChannel::Neck,
    ];

    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// One command queued for the actuator link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    Angle {
        channel: ActuatorChannel,
        degrees: f32,
    },
    Direction {
        channel: ActuatorChannel,
        direction: Direction,
    },
    StepRate {
        channel: ActuatorChannel,
        magnitude: u16,
    },
}

/// Sink bound to one channel that queues commands for the link writer.
///
/// Sending never blocks. If the queue is full or the writer has gone away
/// the command is dropped; the next tick sends the full state again.
#[derive(Debug, Clone)]
pub struct LinkSink {
    channel: ActuatorChannel,
    queue: Sender<ActuatorCommand>,
}

impl LinkSink {
    #[must_use]
    pub fn new(channel: ActuatorChannel, queue: Sender<ActuatorCommand>) -> Self {
        Self { channel, queue }
    }

    fn push(&self, command: ActuatorCommand) {
        match self.queue.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                debug!("Actuator link backlogged, dropping {:?}", command);
            }
            Err(TrySendError::Closed(command)) => {
                trace!("Actuator link closed, dropping {:?}", command);
            }
        }
    }
}

impl AngleActuator for LinkSink {
    fn set_angle(&mut self, degrees: f32) {
        self.push(ActuatorCommand::Angle {
            channel: self.channel,
            degrees,
        });
    }
}

impl DirectionalStepSink for LinkSink {
    fn set_direction(&mut self, direction: Direction) {
        self.push(ActuatorCommand::Direction {
            channel: self.channel,
            direction,
        });
    }

    fn set_step_rate(&mut self, magnitude: u16) {
        self.push(ActuatorCommand::StepRate {
            channel: self.channel,
            magnitude,
        });
    }
}

/// Every sink the control loop commands, one per physical actuator.
pub struct ActuatorSet {
    pub arm_left: Box<dyn AngleActuator>,
    pub arm_right: Box<dyn AngleActuator>,
    pub eye_left: Box<dyn AngleActuator>,
    pub eye_right: Box<dyn AngleActuator>,
    pub drive_left: Box<dyn DirectionalStepSink>,
    pub drive_right: Box<dyn DirectionalStepSink>,
    pub neck: Box<dyn DirectionalStepSink>,
}

impl std::fmt::Debug for ActuatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorSet").finish_non_exhaustive()
    }
}

impl ActuatorSet {
    /// Wires every channel to the link queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use animatronic_bridge::actuator::{ActuatorCommand, ActuatorChannel, ActuatorSet};
    ///
    /// let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    /// let mut set = ActuatorSet::linked(tx);
    /// set.arm_left.set_angle(45.0);
    ///
    /// assert_eq!(
    ///     rx.try_recv().unwrap(),
    ///     ActuatorCommand::Angle { channel: ActuatorChannel::ArmLeft, degrees: 45.0 }
    /// );
    /// ```
    #[must_use]
    pub fn linked(queue: Sender<ActuatorCommand>) -> Self {
        let sink = |channel| LinkSink::new(channel, queue.clone());
        Self {
            arm_left: Box::new(sink(ActuatorChannel::ArmLeft)),
            arm_right: Box::new(sink(ActuatorChannel::ArmRight)),
            eye_left: Box::new(sink(ActuatorChannel::EyeLeft)),
            eye_right: Box::new(sink(ActuatorChannel::EyeRight)),
            drive_left: Box::new(sink(ActuatorChannel::DriveLeft)),
            drive_right: Box::new(sink(ActuatorChannel::DriveRight)),
            neck: Box::new(sink(ActuatorChannel::Neck)),
        }
    }
}
