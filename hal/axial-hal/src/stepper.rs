//! Stepper channel abstraction
//!
//! Raw hardware quantities. Positions and velocities are in rescaled units
//! (steps multiplied by the rescale factor) and carry the hardware's sign
//! convention; direction correction happens in the drivers.

use crate::channel::{Channel, ChannelError};

/// Stepper control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    /// Target position governs motion
    #[default]
    Step,
    /// Continuous rotation; the signed velocity limit governs motion
    Run,
}

/// Hardware-reported range of a settable quantity
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounds<T> {
    /// Minimum accepted value
    pub min: T,
    /// Maximum accepted value
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    /// Create a new range
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Check if a value lies within the range (inclusive)
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Stepper motion channel
///
/// All queries and commands fail with [`ChannelError::NotAttached`] while the
/// channel is detached.
pub trait StepperChannel: Channel {
    /// Current position
    fn position(&self) -> Result<f64, ChannelError>;

    /// Shift both position and target position by `offset` without moving
    fn add_position_offset(&mut self, offset: f64) -> Result<(), ChannelError>;

    /// Current target position
    fn target_position(&self) -> Result<f64, ChannelError>;

    /// Set the target position (effective in step mode)
    fn set_target_position(&mut self, position: f64) -> Result<(), ChannelError>;

    /// Current velocity
    fn velocity(&self) -> Result<f64, ChannelError>;

    /// Current velocity limit
    fn velocity_limit(&self) -> Result<f64, ChannelError>;

    /// Set the velocity limit
    ///
    /// In step mode this is a magnitude. In run mode it is the signed
    /// velocity to rotate at; zero stops the motor.
    fn set_velocity_limit(&mut self, limit: f64) -> Result<(), ChannelError>;

    /// Accepted velocity limit range
    fn velocity_limit_bounds(&self) -> Result<Bounds<f64>, ChannelError>;

    /// Current acceleration
    fn acceleration(&self) -> Result<f64, ChannelError>;

    /// Set the acceleration
    fn set_acceleration(&mut self, acceleration: f64) -> Result<(), ChannelError>;

    /// Accepted acceleration range
    fn acceleration_bounds(&self) -> Result<Bounds<f64>, ChannelError>;

    /// Current limit in amps
    fn current_limit(&self) -> Result<f64, ChannelError>;

    /// Set the current limit in amps
    fn set_current_limit(&mut self, current: f64) -> Result<(), ChannelError>;

    /// Accepted current limit range
    fn current_limit_bounds(&self) -> Result<Bounds<f64>, ChannelError>;

    /// Holding current limit in amps
    fn holding_current_limit(&self) -> Result<f64, ChannelError>;

    /// Set the holding current limit in amps
    fn set_holding_current_limit(&mut self, current: f64) -> Result<(), ChannelError>;

    /// Rescale factor applied to steps
    fn rescale_factor(&self) -> Result<f64, ChannelError>;

    /// Set the rescale factor
    fn set_rescale_factor(&mut self, factor: f64) -> Result<(), ChannelError>;

    /// Interval between position/velocity reports in milliseconds
    fn data_interval(&self) -> Result<u32, ChannelError>;

    /// Set the report interval in milliseconds
    fn set_data_interval(&mut self, interval_ms: u32) -> Result<(), ChannelError>;

    /// Accepted report interval range
    fn data_interval_bounds(&self) -> Result<Bounds<u32>, ChannelError>;

    /// Current control mode
    fn control_mode(&self) -> Result<ControlMode, ChannelError>;

    /// Switch control mode
    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), ChannelError>;

    /// Check if the motor is moving
    fn is_moving(&self) -> Result<bool, ChannelError>;

    /// Check if the motor is engaged (powered)
    fn engaged(&self) -> Result<bool, ChannelError>;

    /// Engage or release the motor
    fn set_engaged(&mut self, engaged: bool) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::new(0.0, 10.0);
        assert!(b.contains(0.0));
        assert!(b.contains(10.0));
        assert!(!b.contains(-0.1));
        assert!(!b.contains(10.1));
    }

    #[test]
    fn test_default_mode_is_step() {
        assert_eq!(ControlMode::default(), ControlMode::Step);
    }
}
