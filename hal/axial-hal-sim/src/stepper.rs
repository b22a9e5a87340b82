//! Simulated stepper
//!
//! Motion is not integrated over time. A commanded move marks the motor as
//! moving; the probe decides when it arrives ([`SimProbe::finish_move`]) or
//! where it is along the way ([`SimProbe::travel_to`]).

use axial_hal::{Bounds, ChannelError, ControlMode, EventPayload, StepperChannel};

use crate::port::{Outbox, SimChannel, SimModel, SimProbe};
use crate::{check, INVALID_ARGUMENT};

/// Commands received by a simulated stepper, in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepperCommand {
    AddPositionOffset(f64),
    SetTargetPosition(f64),
    SetVelocityLimit(f64),
    SetAcceleration(f64),
    SetCurrentLimit(f64),
    SetHoldingCurrentLimit(f64),
    SetRescaleFactor(f64),
    SetDataInterval(u32),
    SetControlMode(ControlMode),
    SetEngaged(bool),
}

/// State of a simulated stepper
#[derive(Debug, Clone)]
pub struct StepperModel {
    pub position: f64,
    pub target_position: f64,
    pub velocity: f64,
    pub velocity_limit: f64,
    pub acceleration: f64,
    pub current_limit: f64,
    pub holding_current_limit: f64,
    pub rescale_factor: f64,
    pub data_interval: u32,
    pub control_mode: ControlMode,
    pub engaged: bool,
    pub moving: bool,
    pub velocity_limit_bounds: Bounds<f64>,
    pub acceleration_bounds: Bounds<f64>,
    pub current_limit_bounds: Bounds<f64>,
    pub data_interval_bounds: Bounds<u32>,
    /// Every command received since creation
    pub commands: Vec<StepperCommand>,
}

impl Default for StepperModel {
    fn default() -> Self {
        Self {
            position: 0.0,
            target_position: 0.0,
            velocity: 0.0,
            velocity_limit: 10_000.0,
            acceleration: 10_000.0,
            current_limit: 1.0,
            holding_current_limit: 0.0,
            rescale_factor: 1.0,
            data_interval: 250,
            control_mode: ControlMode::Step,
            engaged: false,
            moving: false,
            velocity_limit_bounds: Bounds::new(0.0, 115_000.0),
            acceleration_bounds: Bounds::new(2.0, 10_000_000.0),
            current_limit_bounds: Bounds::new(0.0, 4.0),
            data_interval_bounds: Bounds::new(8, 60_000),
            commands: Vec::new(),
        }
    }
}

impl SimModel for StepperModel {
    fn reset(&mut self) {
        let defaults = StepperModel::default();
        self.target_position = self.position;
        self.velocity = 0.0;
        self.velocity_limit = defaults.velocity_limit;
        self.acceleration = defaults.acceleration;
        self.current_limit = defaults.current_limit;
        self.holding_current_limit = defaults.holding_current_limit;
        self.rescale_factor = defaults.rescale_factor;
        self.data_interval = defaults.data_interval;
        self.control_mode = ControlMode::Step;
        self.engaged = false;
        self.moving = false;
    }
}

impl StepperModel {
    /// Number of commands matching a predicate
    pub fn count(&self, f: impl Fn(&StepperCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| f(c)).count()
    }

    /// Number of `set_velocity_limit(0)` commands (stops)
    pub fn stop_count(&self) -> usize {
        self.count(|c| matches!(c, StepperCommand::SetVelocityLimit(v) if *v == 0.0))
    }

    fn halt(&mut self, outbox: &mut Outbox) {
        if self.moving {
            self.moving = false;
            self.velocity = 0.0;
            outbox.push(EventPayload::VelocityChange(0.0));
            outbox.push(EventPayload::Stopped);
        }
    }

    /// Start moving if the current command state asks for motion
    fn update_motion(&mut self, outbox: &mut Outbox) {
        let wants_motion = self.engaged
            && self.velocity_limit != 0.0
            && match self.control_mode {
                ControlMode::Step => self.target_position != self.position,
                ControlMode::Run => true,
            };

        if !wants_motion {
            self.halt(outbox);
            return;
        }

        let velocity = match self.control_mode {
            ControlMode::Step => {
                let magnitude = self.velocity_limit.abs();
                if self.target_position > self.position {
                    magnitude
                } else {
                    -magnitude
                }
            }
            ControlMode::Run => self.velocity_limit,
        };
        if !self.moving || self.velocity != velocity {
            self.velocity = velocity;
            outbox.push(EventPayload::VelocityChange(velocity));
        }
        self.moving = true;
    }
}

/// Simulated stepper channel
pub type SimStepper<'q, const N: usize = { axial_hal::DEFAULT_QUEUE_DEPTH }> =
    SimChannel<'q, StepperModel, N>;

impl<'q, const N: usize> StepperChannel for SimChannel<'q, StepperModel, N> {
    fn position(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.position)
    }

    fn add_position_offset(&mut self, offset: f64) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.commands.push(StepperCommand::AddPositionOffset(offset));
            m.position += offset;
            m.target_position += offset;
            Ok(())
        })
    }

    fn target_position(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.target_position)
    }

    fn set_target_position(&mut self, position: f64) -> Result<(), ChannelError> {
        self.command(|m, outbox| {
            m.commands.push(StepperCommand::SetTargetPosition(position));
            m.target_position = position;
            if m.control_mode == ControlMode::Step {
                m.update_motion(outbox);
            }
            Ok(())
        })
    }

    fn velocity(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.velocity)
    }

    fn velocity_limit(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.velocity_limit)
    }

    fn set_velocity_limit(&mut self, limit: f64) -> Result<(), ChannelError> {
        self.command(|m, outbox| {
            m.commands.push(StepperCommand::SetVelocityLimit(limit));
            // Step mode takes a magnitude; run mode accepts either sign
            let magnitude = match m.control_mode {
                ControlMode::Step => limit,
                ControlMode::Run => limit.abs(),
            };
            check(m.velocity_limit_bounds, magnitude)?;
            m.velocity_limit = limit;
            m.update_motion(outbox);
            Ok(())
        })
    }

    fn velocity_limit_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.query(|m| m.velocity_limit_bounds)
    }

    fn acceleration(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.acceleration)
    }

    fn set_acceleration(&mut self, acceleration: f64) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.commands.push(StepperCommand::SetAcceleration(acceleration));
            check(m.acceleration_bounds, acceleration)?;
            m.acceleration = acceleration;
            Ok(())
        })
    }

    fn acceleration_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.query(|m| m.acceleration_bounds)
    }

    fn current_limit(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.current_limit)
    }

    fn set_current_limit(&mut self, current: f64) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.commands.push(StepperCommand::SetCurrentLimit(current));
            check(m.current_limit_bounds, current)?;
            m.current_limit = current;
            Ok(())
        })
    }

    fn current_limit_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.query(|m| m.current_limit_bounds)
    }

    fn holding_current_limit(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.holding_current_limit)
    }

    fn set_holding_current_limit(&mut self, current: f64) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.commands.push(StepperCommand::SetHoldingCurrentLimit(current));
            check(m.current_limit_bounds, current)?;
            m.holding_current_limit = current;
            Ok(())
        })
    }

    fn rescale_factor(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.rescale_factor)
    }

    fn set_rescale_factor(&mut self, factor: f64) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.commands.push(StepperCommand::SetRescaleFactor(factor));
            if factor == 0.0 {
                return Err(ChannelError::Hardware {
                    code: INVALID_ARGUMENT,
                });
            }
            m.rescale_factor = factor;
            Ok(())
        })
    }

    fn data_interval(&self) -> Result<u32, ChannelError> {
        self.query(|m| m.data_interval)
    }

    fn set_data_interval(&mut self, interval_ms: u32) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.commands.push(StepperCommand::SetDataInterval(interval_ms));
            check(m.data_interval_bounds, interval_ms)?;
            m.data_interval = interval_ms;
            Ok(())
        })
    }

    fn data_interval_bounds(&self) -> Result<Bounds<u32>, ChannelError> {
        self.query(|m| m.data_interval_bounds)
    }

    fn control_mode(&self) -> Result<ControlMode, ChannelError> {
        self.query(|m| m.control_mode)
    }

    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), ChannelError> {
        self.command(|m, outbox| {
            m.commands.push(StepperCommand::SetControlMode(mode));
            if m.control_mode != mode {
                m.halt(outbox);
                m.control_mode = mode;
                m.target_position = m.position;
            }
            Ok(())
        })
    }

    fn is_moving(&self) -> Result<bool, ChannelError> {
        self.query(|m| m.moving)
    }

    fn engaged(&self) -> Result<bool, ChannelError> {
        self.query(|m| m.engaged)
    }

    fn set_engaged(&mut self, engaged: bool) -> Result<(), ChannelError> {
        self.command(|m, outbox| {
            m.commands.push(StepperCommand::SetEngaged(engaged));
            m.engaged = engaged;
            m.update_motion(outbox);
            Ok(())
        })
    }
}

impl<'q, const N: usize> SimProbe<'q, StepperModel, N> {
    /// Move partway, reporting the new position
    pub fn travel_to(&self, position: f64) {
        self.update(|m, outbox| {
            if m.position != position {
                m.position = position;
                outbox.push(EventPayload::PositionChange(position));
            }
        });
    }

    /// Complete the current move
    ///
    /// In step mode the motor arrives at its target. In run mode it comes to
    /// rest where it is.
    pub fn finish_move(&self) {
        self.update(|m, outbox| {
            if !m.moving {
                return;
            }
            if m.control_mode == ControlMode::Step && m.position != m.target_position {
                m.position = m.target_position;
                outbox.push(EventPayload::PositionChange(m.position));
            }
            m.halt(outbox);
        });
    }

    pub fn position(&self) -> f64 {
        self.with_model(|m| m.position)
    }

    pub fn target_position(&self) -> f64 {
        self.with_model(|m| m.target_position)
    }

    pub fn velocity_limit(&self) -> f64 {
        self.with_model(|m| m.velocity_limit)
    }

    pub fn control_mode(&self) -> ControlMode {
        self.with_model(|m| m.control_mode)
    }

    pub fn is_moving(&self) -> bool {
        self.with_model(|m| m.moving)
    }

    pub fn engaged(&self) -> bool {
        self.with_model(|m| m.engaged)
    }

    pub fn stop_count(&self) -> usize {
        self.with_model(|m| m.stop_count())
    }

    pub fn commands(&self) -> Vec<StepperCommand> {
        self.with_model(|m| m.commands.clone())
    }
}
