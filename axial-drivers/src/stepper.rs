//! Direction-corrected stepper
//!
//! Wraps a stepper channel so that positive always means the configured
//! physical direction. Positions, velocities, targets and offsets are passed
//! through the joint's [`Direction`] in both directions; the step-mode
//! velocity limit is a magnitude and is never signed.
//!
//! Channels lose their configuration when they detach, so the motion config
//! is re-applied on every attach and the motor is engaged afterwards.

use alloc::boxed::Box;

use axial_core::config::{MotionConfig, StepperConfig};
use axial_core::motion::Direction;
use axial_hal::{
    Bounds, ChannelError, ChannelEvent, ChannelHandle, ControlMode, EventKind, EventPayload,
    StepperChannel,
};

use crate::component::{ChannelPort, Subscriber};

/// Stopped callback
pub type StoppedHandler = Box<dyn FnMut()>;

/// Position or velocity callback (direction-corrected value)
pub type ValueHandler = Box<dyn FnMut(f64)>;

/// Notification for the owning coordinator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperNotice {
    Stopped,
    /// Direction-corrected position
    Position(f64),
    /// Direction-corrected velocity
    Velocity(f64),
}

fn magnitude(value: f64) -> f64 {
    if value.is_sign_negative() {
        -value
    } else {
        value
    }
}

/// Stepper with direction correction
pub struct DirectionStepper<S> {
    port: ChannelPort<S>,
    motion: MotionConfig,
    direction: Direction,
    on_stopped: Option<Subscriber<StoppedHandler>>,
    on_position: Option<Subscriber<ValueHandler>>,
    on_velocity: Option<Subscriber<ValueHandler>>,
}

impl<S: StepperChannel> DirectionStepper<S> {
    pub fn new(name: &str, config: &StepperConfig, channel: S) -> Self {
        Self {
            port: ChannelPort::new(name, config.address.clone(), channel),
            motion: config.motion.clone(),
            direction: config.motion.direction(),
            on_stopped: None,
            on_position: None,
            on_velocity: None,
        }
    }

    pub fn name(&self) -> &str {
        self.port.name()
    }

    pub fn handle(&self) -> ChannelHandle {
        self.port.handle()
    }

    pub fn has_handle(&self, handle: ChannelHandle) -> bool {
        self.port.has_handle(handle)
    }

    pub fn is_attached(&self) -> bool {
        self.port.is_attached()
    }

    pub fn port(&self) -> &ChannelPort<S> {
        &self.port
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Motion settings applied on attach
    pub fn motion_config(&self) -> &MotionConfig {
        &self.motion
    }

    pub fn open(&mut self) -> Result<(), ChannelError> {
        self.port.open()
    }

    /// Drop subscriptions, release the motor, then close the channel
    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.set_on_position_change_handler(None);
        self.set_on_velocity_change_handler(None);
        self.set_on_stopped_handler(None);

        let disengaged = if self.is_attached() {
            self.disable()
        } else {
            Ok(())
        };
        let closed = self.port.close();
        disengaged.and(closed)
    }

    /// Attach handler: resolve the address, re-apply the motion config and
    /// engage the motor
    pub fn on_attach(&mut self) -> Result<(), ChannelError> {
        self.port.attached()?;

        // Fresh hardware comes up in step mode
        self.set_step_control_mode()?;
        self.set_data_interval(self.motion.data_interval_ms)?;
        self.set_rescale_factor(self.motion.rescale_factor)?;
        self.set_acceleration(self.motion.acceleration)?;
        self.set_current_limit(self.motion.current_limit)?;
        self.set_holding_current_limit(self.motion.holding_current_limit)?;
        self.set_velocity_limit(self.motion.velocity_limit)?;
        self.enable()?;

        debug!(
            "{} configured: velocity_limit={} acceleration={}",
            self.name(),
            self.motion.velocity_limit,
            self.motion.acceleration
        );
        Ok(())
    }

    fn channel(&self) -> &S {
        self.port.channel()
    }

    fn channel_mut(&mut self) -> &mut S {
        self.port.channel_mut()
    }

    // Motion

    pub fn position(&self) -> Result<f64, ChannelError> {
        Ok(self.direction.apply(self.channel().position()?))
    }

    /// Shift the logical position by `offset` without moving
    pub fn add_position_offset(&mut self, offset: f64) -> Result<(), ChannelError> {
        let raw = self.direction.apply(offset);
        self.channel_mut().add_position_offset(raw)
    }

    pub fn target_position(&self) -> Result<f64, ChannelError> {
        Ok(self.direction.apply(self.channel().target_position()?))
    }

    /// Set the target position
    ///
    /// Only honored in step mode; in velocity mode the call is ignored.
    pub fn set_target_position(&mut self, position: f64) -> Result<(), ChannelError> {
        if !self.in_step_control_mode()? {
            trace!("{} ignoring target {} outside step mode", self.name(), position);
            return Ok(());
        }
        let raw = self.direction.apply(position);
        self.channel_mut().set_target_position(raw)
    }

    pub fn velocity(&self) -> Result<f64, ChannelError> {
        Ok(self.direction.apply(self.channel().velocity()?))
    }

    pub fn is_moving(&self) -> Result<bool, ChannelError> {
        self.channel().is_moving()
    }

    /// Current velocity limit
    ///
    /// A magnitude in step mode, a signed velocity in velocity mode.
    pub fn velocity_limit(&self) -> Result<f64, ChannelError> {
        let raw = self.channel().velocity_limit()?;
        if self.in_step_control_mode()? {
            Ok(raw)
        } else {
            Ok(self.direction.apply(raw))
        }
    }

    /// Set the velocity limit
    ///
    /// In step mode the sign is dropped. In velocity mode the value is the
    /// signed velocity to run at.
    pub fn set_velocity_limit(&mut self, limit: f64) -> Result<(), ChannelError> {
        let raw = if self.in_step_control_mode()? {
            magnitude(limit)
        } else {
            self.direction.apply(limit)
        };
        self.channel_mut().set_velocity_limit(raw)
    }

    pub fn velocity_limit_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.channel().velocity_limit_bounds()
    }

    /// Halt motion
    pub fn stop(&mut self) -> Result<(), ChannelError> {
        self.set_velocity_limit(0.0)
    }

    // Control mode

    pub fn in_step_control_mode(&self) -> Result<bool, ChannelError> {
        Ok(self.channel().control_mode()? == ControlMode::Step)
    }

    /// Target position governs motion
    pub fn set_step_control_mode(&mut self) -> Result<(), ChannelError> {
        self.channel_mut().set_control_mode(ControlMode::Step)
    }

    /// Signed velocity limit governs motion
    pub fn set_velocity_control_mode(&mut self) -> Result<(), ChannelError> {
        self.channel_mut().set_control_mode(ControlMode::Run)
    }

    // Engagement

    pub fn enable(&mut self) -> Result<(), ChannelError> {
        self.channel_mut().set_engaged(true)
    }

    pub fn disable(&mut self) -> Result<(), ChannelError> {
        self.channel_mut().set_engaged(false)
    }

    pub fn is_enabled(&self) -> Result<bool, ChannelError> {
        self.channel().engaged()
    }

    // Limits and settings

    pub fn acceleration(&self) -> Result<f64, ChannelError> {
        self.channel().acceleration()
    }

    pub fn set_acceleration(&mut self, acceleration: f64) -> Result<(), ChannelError> {
        self.channel_mut().set_acceleration(acceleration)
    }

    pub fn acceleration_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.channel().acceleration_bounds()
    }

    pub fn current_limit(&self) -> Result<f64, ChannelError> {
        self.channel().current_limit()
    }

    pub fn set_current_limit(&mut self, current: f64) -> Result<(), ChannelError> {
        self.channel_mut().set_current_limit(current)
    }

    pub fn current_limit_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.channel().current_limit_bounds()
    }

    pub fn holding_current_limit(&self) -> Result<f64, ChannelError> {
        self.channel().holding_current_limit()
    }

    pub fn set_holding_current_limit(&mut self, current: f64) -> Result<(), ChannelError> {
        self.channel_mut().set_holding_current_limit(current)
    }

    pub fn rescale_factor(&self) -> Result<f64, ChannelError> {
        self.channel().rescale_factor()
    }

    pub fn set_rescale_factor(&mut self, factor: f64) -> Result<(), ChannelError> {
        self.channel_mut().set_rescale_factor(factor)
    }

    pub fn data_interval(&self) -> Result<u32, ChannelError> {
        self.channel().data_interval()
    }

    pub fn set_data_interval(&mut self, interval_ms: u32) -> Result<(), ChannelError> {
        self.channel_mut().set_data_interval(interval_ms)
    }

    pub fn data_interval_bounds(&self) -> Result<Bounds<u32>, ChannelError> {
        self.channel().data_interval_bounds()
    }

    // Subscriptions

    /// Replace the stopped subscriber
    pub fn set_on_stopped_handler(&mut self, handler: Option<StoppedHandler>) {
        let subscriber = handler.map(Subscriber::Callback);
        self.port
            .set_event_enabled(EventKind::Stopped, subscriber.is_some());
        self.on_stopped = subscriber;
    }

    /// Replace the position-change subscriber
    pub fn set_on_position_change_handler(&mut self, handler: Option<ValueHandler>) {
        let subscriber = handler.map(Subscriber::Callback);
        self.port
            .set_event_enabled(EventKind::PositionChange, subscriber.is_some());
        self.on_position = subscriber;
    }

    /// Replace the velocity-change subscriber
    pub fn set_on_velocity_change_handler(&mut self, handler: Option<ValueHandler>) {
        let subscriber = handler.map(Subscriber::Callback);
        self.port
            .set_event_enabled(EventKind::VelocityChange, subscriber.is_some());
        self.on_velocity = subscriber;
    }

    /// Route stopped events to the owner (one-shot arming)
    pub(crate) fn subscribe_stopped_owner(&mut self, subscribed: bool) {
        self.port.set_event_enabled(EventKind::Stopped, subscribed);
        self.on_stopped = subscribed.then_some(Subscriber::Owner);
    }

    /// Route position and velocity events to the owner
    pub(crate) fn subscribe_motion_owner(&mut self, subscribed: bool) {
        self.port
            .set_event_enabled(EventKind::PositionChange, subscribed);
        self.port
            .set_event_enabled(EventKind::VelocityChange, subscribed);
        self.on_position = subscribed.then_some(Subscriber::Owner);
        self.on_velocity = subscribed.then_some(Subscriber::Owner);
    }

    /// Process an event raised by this stepper's channel
    ///
    /// Returns a notice when the owner is subscribed to the event.
    pub fn handle_event(&mut self, event: &ChannelEvent) -> Option<StepperNotice> {
        if !self.has_handle(event.handle) {
            return None;
        }

        match event.payload {
            EventPayload::Attach => {
                if let Err(e) = self.on_attach() {
                    warn!("{} attach handling failed: {:?}", self.name(), e);
                }
                None
            }
            EventPayload::Stopped => match self.on_stopped.as_mut() {
                Some(Subscriber::Owner) => Some(StepperNotice::Stopped),
                Some(Subscriber::Callback(handler)) => {
                    handler();
                    None
                }
                None => None,
            },
            EventPayload::PositionChange(raw) => {
                let position = self.direction.apply(raw);
                match self.on_position.as_mut() {
                    Some(Subscriber::Owner) => Some(StepperNotice::Position(position)),
                    Some(Subscriber::Callback(handler)) => {
                        handler(position);
                        None
                    }
                    None => None,
                }
            }
            EventPayload::VelocityChange(raw) => {
                let velocity = self.direction.apply(raw);
                match self.on_velocity.as_mut() {
                    Some(Subscriber::Owner) => Some(StepperNotice::Velocity(velocity)),
                    Some(Subscriber::Callback(handler)) => {
                        handler(velocity);
                        None
                    }
                    None => None,
                }
            }
            ref payload => {
                self.port.log_lifecycle(payload);
                None
            }
        }
    }
}
