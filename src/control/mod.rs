//! # Control Module
//!
//! The per-tick pipeline from gamepad input to actuator commands.
//!
//! ## Tick Order
//!
//! 1. Poll the [`InputSource`]. If no pad is connected, skip to step 6.
//! 2. Arm state machine, including the d-pad-down re-centre.
//! 3. Eye integrator, including the d-pad-up re-centre. Runs after step 2.
//! 4. Drive mixer.
//! 5. Neck direction.
//! 6. Command every actuator from [`RobotState`], connected or not.
//!
//! Each step mutates the one [`RobotState`] owned by the [`ControlLoop`] and
//! may override what an earlier step wrote. Step 6 always runs, so a lost
//! controller leaves every actuator re-commanded with its held value.

pub mod arm;
pub mod drive;
pub mod eyes;
pub mod neck;

use serde::Serialize;

use crate::actuator::{ActuatorSet, Direction};
use crate::config::ControlConfig;
use crate::input::{InputSnapshot, InputSource};
use arm::Arms;
use drive::DriveCommand;
use eyes::Eyes;

/// Tunables for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlParams {
    /// Triggers must exceed this to select or move an arm.
    pub trigger_deadzone: i32,
    /// Stick axes below this magnitude are zeroed before mixing.
    pub drive_deadzone: i32,
    /// Eye movement per tick while L1/R1 is held, in degrees.
    pub eye_step_deg: f32,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            trigger_deadzone: 5,
            drive_deadzone: drive::DRIVE_DEADZONE,
            eye_step_deg: eyes::EYE_STEP_DEG,
        }
    }
}

impl From<&ControlConfig> for ControlParams {
    fn from(config: &ControlConfig) -> Self {
        Self {
            trigger_deadzone: config.trigger_deadzone,
            drive_deadzone: config.drive_deadzone,
            eye_step_deg: config.eye_step_deg,
        }
    }
}

/// Everything the loop remembers between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RobotState {
    pub arms: Arms,
    pub eyes: Eyes,
    /// Last computed drive command, re-sent while disconnected.
    pub drive: DriveCommand,
    /// Last computed neck direction, re-sent while disconnected.
    pub neck: Direction,
}

impl Default for RobotState {
    fn default() -> Self {
        Self {
            arms: Arms::default(),
            eyes: Eyes::default(),
            drive: DriveCommand::default(),
            neck: Direction::Forward,
        }
    }
}

impl RobotState {
    /// Steps 2-5 of the tick, in order.
    pub fn apply_input(&mut self, input: &InputSnapshot, params: &ControlParams) {
        self.arms.update(input, params.trigger_deadzone);
        self.eyes.update(input, params.eye_step_deg);
        self.drive = drive::mix(input.drive_forward, input.drive_turn, params.drive_deadzone);
        self.neck = neck::neck_direction(input.neck_axis);
    }

    /// Step 6: command every sink from the current state.
    pub fn actuate(&self, actuators: &mut ActuatorSet) {
        actuators.arm_left.set_angle(self.arms.left.target_angle);
        actuators.arm_right.set_angle(self.arms.right.target_angle);
        actuators.eye_left.set_angle(self.eyes.left.angle);
        actuators.eye_right.set_angle(self.eyes.right.angle);

        actuators.drive_left.set_direction(self.drive.left_direction());
        actuators.drive_left.set_step_rate(self.drive.left_rate());
        actuators.drive_right.set_direction(self.drive.right_direction());
        actuators.drive_right.set_step_rate(self.drive.right_rate());

        actuators.neck.set_direction(self.neck);
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Input was applied, then actuators commanded.
    Applied,
    /// No pad; actuators re-commanded with held values.
    Held,
}

/// Owns the robot state and the actuators; runs one tick at a time.
///
/// # Examples
///
/// ```
/// use animatronic_bridge::actuator::ActuatorSet;
/// use animatronic_bridge::control::{ControlLoop, ControlParams, TickOutcome};
/// use animatronic_bridge::input::{InputSnapshot, ScriptedInput};
///
/// let (tx, _rx) = tokio::sync::mpsc::channel(64);
/// let mut control = ControlLoop::new(ControlParams::default(), ActuatorSet::linked(tx));
///
/// let pull_left = InputSnapshot { left_trigger: 1023, ..Default::default() };
/// let mut input = ScriptedInput::new([Some(pull_left), None]);
///
/// assert_eq!(control.tick(&mut input), TickOutcome::Applied);
/// assert_eq!(control.tick(&mut input), TickOutcome::Held);
/// assert_eq!(control.state().arms.left.target_angle, 20.0);
/// ```
#[derive(Debug)]
pub struct ControlLoop {
    state: RobotState,
    params: ControlParams,
    actuators: ActuatorSet,
    ticks: u64,
}

impl ControlLoop {
    #[must_use]
    pub fn new(params: ControlParams, actuators: ActuatorSet) -> Self {
        Self {
            state: RobotState::default(),
            params,
            actuators,
            ticks: 0,
        }
    }

    /// Runs one full tick.
    pub fn tick<S: InputSource + ?Sized>(&mut self, source: &mut S) -> TickOutcome {
        let outcome = match source.poll() {
            Some(input) => {
                self.state.apply_input(&input, &self.params);
                TickOutcome::Applied
            }
            None => TickOutcome::Held,
        };

        self.state.actuate(&mut self.actuators);
        self.ticks += 1;
        outcome
    }

    #[must_use]
    pub fn state(&self) -> &RobotState {
        &self.state
    }

    #[must_use]
    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    /// Ticks run so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
