//! # Animatronic Bridge Library
//!
//! Drive an animatronic robot (two arms, two eyes, a differential base and a
//! neck) from a gamepad.
//!
//! This library provides the real-time control core that turns gamepad
//! snapshots into servo angles and stepper directions, plus the evdev input
//! backend and the serial link to the actuator board.

pub mod actuator;
pub mod config;
pub mod control;
pub mod error;
pub mod input;
pub mod link;
pub mod telemetry;
