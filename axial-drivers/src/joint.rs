//! Stepper joint coordinator
//!
//! A joint owns a direction-corrected stepper, a home switch and an optional
//! limit switch. It drives the homing state machine from switch and stop
//! events, and applies the limit-switch policy independently of homing.
//!
//! Leaves never call back into the joint. The joint subscribes to them as
//! owner and receives their notices from `handle_event`, so no handler holds a
//! reference to joint state.
//!
//! # Homing
//!
//! `home()` reads the home switch:
//!
//! - Inactive: velocity mode at the signed home velocity, toward the switch.
//!   When the switch activates the stepper is stopped; once it reports
//!   stopped the current location becomes logical zero.
//! - Active: step mode toward the clearing target. As soon as the switch
//!   releases the joint seeks as above. If the clearing move ends with the
//!   switch still active the attempt halts and stays open until `home()` or
//!   `cancel_homing()`.

use alloc::boxed::Box;

use axial_core::config::{ConfigError, JointConfig, LimitSwitchMode};
use axial_core::homing::{HomingAction, HomingEvent, HomingPhase, HomingState};
use axial_core::safety::{InterlockAction, LimitInterlock};
use axial_hal::{ChannelError, ChannelEvent, ChannelHandle, DigitalInputChannel, EventPayload, StepperChannel};

use crate::component::{compose_name, Name};
use crate::composite::{Composite, Member};
use crate::error::JointError;
use crate::stepper::{DirectionStepper, StepperNotice};
use crate::switch::{PolaritySwitch, SwitchState};

/// Direction-corrected motion report
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JointState {
    pub position: f64,
    pub velocity: f64,
}

/// Homing completion callback
pub type HomedHandler = Box<dyn FnMut()>;

/// Joint state callback
pub type JointStateHandler = Box<dyn FnMut(JointState)>;

/// Custom limit switch policy
///
/// Receives every limit switch change together with the stepper, attached or
/// not.
pub type LimitSwitchHandler<S> = Box<dyn FnMut(SwitchState, &mut DirectionStepper<S>)>;

/// Active limit switch policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitPolicy {
    Disabled,
    StopOnActive,
    Custom,
}

/// Stepper joint with homing and limit-switch safety
pub struct StepperJoint<S, I> {
    name: Name,
    config: JointConfig,
    stepper: DirectionStepper<S>,
    home_switch: PolaritySwitch<I>,
    limit_switch: Option<PolaritySwitch<I>>,
    state: HomingState,
    interlock: LimitInterlock,
    custom_limit: Option<LimitSwitchHandler<S>>,
    on_homed: Option<HomedHandler>,
    on_joint_state: Option<JointStateHandler>,
    joint_state: JointState,
}

impl<S: StepperChannel, I: DigitalInputChannel> StepperJoint<S, I> {
    /// Build a joint from its configuration and channels
    ///
    /// A limit switch channel must be given exactly when the configuration
    /// has a limit switch.
    pub fn new(
        config: JointConfig,
        stepper: S,
        home_switch: I,
        limit_switch: Option<I>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let name = compose_name(&[config.name.as_str()]);
        let limit_switch = match (config.limit_switch.as_ref(), limit_switch) {
            (Some(switch_config), Some(channel)) => Some(PolaritySwitch::new(
                &compose_name(&[name.as_str(), "_limit_switch"]),
                switch_config,
                channel,
            )),
            (None, None) => None,
            _ => return Err(ConfigError::InvalidValue("limit_switch")),
        };

        Ok(Self {
            stepper: DirectionStepper::new(
                &compose_name(&[name.as_str(), "_stepper"]),
                &config.stepper,
                stepper,
            ),
            home_switch: PolaritySwitch::new(
                &compose_name(&[name.as_str(), "_home_switch"]),
                &config.home_switch,
                home_switch,
            ),
            limit_switch,
            state: HomingState::Idle,
            interlock: LimitInterlock::new(config.limit_switch_mode),
            custom_limit: None,
            on_homed: None,
            on_joint_state: None,
            joint_state: JointState::default(),
            name,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &JointConfig {
        &self.config
    }

    pub fn stepper(&self) -> &DirectionStepper<S> {
        &self.stepper
    }

    /// Stepper for direct motion commands
    ///
    /// Event subscriptions on the stepper belong to the joint; replacing them
    /// breaks homing.
    pub fn stepper_mut(&mut self) -> &mut DirectionStepper<S> {
        &mut self.stepper
    }

    pub fn home_switch(&self) -> &PolaritySwitch<I> {
        &self.home_switch
    }

    pub fn limit_switch(&self) -> Option<&PolaritySwitch<I>> {
        self.limit_switch.as_ref()
    }

    /// Every member present is attached
    ///
    /// An absent limit switch is not counted.
    pub fn is_attached(&self) -> bool {
        self.stepper.is_attached()
            && self.home_switch.is_attached()
            && self.limit_switch.as_ref().map_or(true, |s| s.is_attached())
    }

    pub fn has_handle(&self, handle: ChannelHandle) -> bool {
        self.stepper.has_handle(handle)
            || self.home_switch.has_handle(handle)
            || self
                .limit_switch
                .as_ref()
                .is_some_and(|s| s.has_handle(handle))
    }

    fn composite(&mut self) -> Composite<'_, S, I> {
        let mut composite = Composite::new();
        // At most three members, well under capacity
        let _ = composite.add(Member::Actuator(&mut self.stepper));
        let _ = composite.add(Member::Switch(&mut self.home_switch));
        if let Some(limit) = self.limit_switch.as_mut() {
            let _ = composite.add(Member::Switch(limit));
        }
        composite
    }

    /// Subscribe to the leaves and open every channel
    ///
    /// If any channel fails to open, all of them are closed again before the
    /// error is returned.
    pub fn open(&mut self) -> Result<(), JointError> {
        self.home_switch.subscribe_owner(true);
        self.subscribe_limit_switch();
        self.stepper
            .subscribe_motion_owner(self.on_joint_state.is_some());

        let opened = self.composite().open();
        if let Err(e) = opened {
            error!("{} failed to open: {}", self.name.as_str(), e);
            let closed = self.composite().close();
            if let Err(close_err) = closed {
                warn!("{} rollback close failed: {}", self.name.as_str(), close_err);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Close every channel
    ///
    /// An open homing attempt is abandoned. Closing twice is harmless.
    pub fn close(&mut self) -> Result<(), JointError> {
        if self.state.is_homing() {
            info!("{} homing abandoned on close", self.name.as_str());
            self.state = HomingState::Idle;
        }
        self.interlock.reset();
        self.composite().close()?;
        Ok(())
    }

    // Homing

    pub fn state(&self) -> HomingState {
        self.state
    }

    pub fn is_homed(&self) -> bool {
        self.state.is_homed()
    }

    pub fn is_homing(&self) -> bool {
        self.state.is_homing()
    }

    /// Start (or restart) homing
    ///
    /// Fails with `NotAttached` if the stepper is not attached; the homing
    /// state is left unchanged on any failure.
    pub fn home(&mut self) -> Result<(), JointError> {
        self.stepper.port().require_attached()?;
        let switch_active = self.home_switch.is_active()?;
        info!(
            "{} homing started, home switch active: {}",
            self.name.as_str(),
            switch_active
        );
        self.advance(HomingEvent::Start { switch_active })?;
        Ok(())
    }

    /// Abandon an open homing attempt without re-zeroing
    pub fn cancel_homing(&mut self) -> Result<(), JointError> {
        self.advance(HomingEvent::Cancel)?;
        Ok(())
    }

    pub fn set_on_homed_handler(&mut self, handler: Option<HomedHandler>) {
        self.on_homed = handler;
    }

    fn advance(&mut self, event: HomingEvent) -> Result<(), ChannelError> {
        let (next, action) = self.state.transition(event);
        self.execute(action)?;

        if next != self.state {
            trace!("{} homing {:?} -> {:?}", self.name.as_str(), self.state, next);
        }
        self.state = next;

        if action == HomingAction::Complete {
            info!("{} homed", self.name.as_str());
            if let Some(handler) = self.on_homed.as_mut() {
                handler();
            }
        }
        Ok(())
    }

    fn execute(&mut self, action: HomingAction) -> Result<(), ChannelError> {
        if action == HomingAction::None {
            return Ok(());
        }

        // Mode changes halt the motor; only the commanded move's stop may
        // reach the machine
        self.stepper.subscribe_stopped_owner(false);
        self.prepare(action)?;
        self.stepper.subscribe_stopped_owner(action.arms_stopped());
        self.command(action)
    }

    /// Mode and bookkeeping changes ahead of the motion command
    fn prepare(&mut self, action: HomingAction) -> Result<(), ChannelError> {
        match action {
            HomingAction::Seek => self.stepper.set_velocity_control_mode()?,
            HomingAction::ClearSwitch => {
                self.stepper.set_step_control_mode()?;
                // A previous stop() leaves a zero limit behind
                self.stepper
                    .set_velocity_limit(self.config.home_velocity_limit)?;
            }
            HomingAction::Complete => {
                self.stepper.set_step_control_mode()?;
                let position = self.stepper.position()?;
                self.stepper.add_position_offset(-position)?;
                self.stepper.set_target_position(0.0)?;
                self.stepper
                    .set_velocity_limit(self.config.stepper.motion.velocity_limit)?;

                self.joint_state.position = 0.0;
                self.joint_state.velocity = self.stepper.velocity()?;
                self.publish_joint_state();
            }
            HomingAction::Halt => warn!(
                "{} homing failed: home switch still active after clearing move",
                self.name.as_str()
            ),
            HomingAction::Abort => info!("{} homing cancelled", self.name.as_str()),
            HomingAction::None | HomingAction::StopAndAwait => {}
        }
        Ok(())
    }

    fn command(&mut self, action: HomingAction) -> Result<(), ChannelError> {
        match action {
            HomingAction::Seek => self
                .stepper
                .set_velocity_limit(self.config.home_velocity_limit),
            HomingAction::ClearSwitch => self
                .stepper
                .set_target_position(self.config.deactivate_home_switch_target_position),
            HomingAction::StopAndAwait | HomingAction::Halt => self.stepper.stop(),
            HomingAction::Abort if self.stepper.is_attached() => self.stepper.stop(),
            _ => Ok(()),
        }
    }

    fn advance_from_event(&mut self, event: HomingEvent) {
        if let Err(e) = self.advance(event) {
            error!("{} homing step failed: {:?}", self.name.as_str(), e);
        }
    }

    fn on_home_switch(&mut self, state: SwitchState) {
        if !self.state.is_homing() {
            return;
        }
        if !self.stepper.is_attached() {
            debug!("{} home switch change before stepper attached", self.name.as_str());
            return;
        }

        match self.stepper.is_moving() {
            Ok(moving) => self.advance_from_event(HomingEvent::SwitchChanged {
                active: state.active,
                moving,
            }),
            Err(e) => error!("{} failed to query motion: {:?}", self.name.as_str(), e),
        }
    }

    fn on_stopped(&mut self) {
        // One-shot
        self.stepper.subscribe_stopped_owner(false);
        if !self.state.is_homing() {
            return;
        }

        match self.home_switch.is_active() {
            Ok(switch_active) => self.advance_from_event(HomingEvent::Stopped { switch_active }),
            Err(e) => error!("{} failed to read home switch: {:?}", self.name.as_str(), e),
        }
    }

    // Limit switch

    /// Current limit switch policy
    pub fn limit_policy(&self) -> LimitPolicy {
        if self.custom_limit.is_some() {
            LimitPolicy::Custom
        } else {
            match self.interlock.mode() {
                LimitSwitchMode::Disabled => LimitPolicy::Disabled,
                LimitSwitchMode::StopOnActive => LimitPolicy::StopOnActive,
            }
        }
    }

    /// Stop the stepper whenever the limit switch becomes active
    pub fn set_limit_switch_handler_to_stop(&mut self) {
        self.custom_limit = None;
        self.interlock.set_mode(LimitSwitchMode::StopOnActive);
        self.subscribe_limit_switch();
    }

    /// Ignore the limit switch
    pub fn set_limit_switch_handler_to_disabled(&mut self) {
        self.custom_limit = None;
        self.interlock.set_mode(LimitSwitchMode::Disabled);
        self.subscribe_limit_switch();
    }

    /// Replace the limit switch policy with a custom handler
    pub fn set_limit_switch_handler(&mut self, handler: LimitSwitchHandler<S>) {
        self.custom_limit = Some(handler);
        self.interlock.reset();
        self.subscribe_limit_switch();
    }

    fn subscribe_limit_switch(&mut self) {
        let subscribed = self.limit_policy() != LimitPolicy::Disabled;
        if let Some(limit) = self.limit_switch.as_mut() {
            limit.subscribe_owner(subscribed);
        }
    }

    fn on_limit_switch(&mut self, state: SwitchState) {
        if let Some(handler) = self.custom_limit.as_mut() {
            handler(state, &mut self.stepper);
            return;
        }

        if self.interlock.update(state.active) != InterlockAction::Stop {
            return;
        }
        if !self.stepper.is_attached() {
            debug!("{} limit switch active before stepper attached", self.name.as_str());
            return;
        }
        match self.stepper.stop() {
            Ok(()) => warn!("{} limit switch active, stepper stopped", self.name.as_str()),
            Err(e) => error!("{} limit stop failed: {:?}", self.name.as_str(), e),
        }
    }

    // Joint state

    /// Last reported direction-corrected position and velocity
    pub fn joint_state(&self) -> JointState {
        self.joint_state
    }

    /// Replace the joint state subscriber
    ///
    /// `None` also stops position and velocity reports from the stepper.
    pub fn set_on_joint_state_handler(&mut self, handler: Option<JointStateHandler>) {
        self.stepper.subscribe_motion_owner(handler.is_some());
        self.on_joint_state = handler;
    }

    fn on_stepper_notice(&mut self, notice: StepperNotice) {
        match notice {
            StepperNotice::Stopped => self.on_stopped(),
            StepperNotice::Position(position) => {
                self.joint_state.position = position;
                self.publish_joint_state();
            }
            StepperNotice::Velocity(velocity) => {
                self.joint_state.velocity = velocity;
                self.publish_joint_state();
            }
        }
    }

    fn publish_joint_state(&mut self) {
        if let Some(handler) = self.on_joint_state.as_mut() {
            handler(self.joint_state);
        }
    }

    /// Process one event from the queue
    ///
    /// Returns false if the event belongs to none of this joint's channels.
    pub fn handle_event(&mut self, event: &ChannelEvent) -> bool {
        let handle = event.handle;
        if !self.has_handle(handle) {
            return false;
        }

        if let EventPayload::Attach = event.payload {
            self.composite().dispatch_attach(handle);
            return true;
        }

        if self.stepper.has_handle(handle) {
            if let Some(notice) = self.stepper.handle_event(event) {
                self.on_stepper_notice(notice);
            }
        } else if self.home_switch.has_handle(handle) {
            if let Some(state) = self.home_switch.handle_event(event) {
                self.on_home_switch(state);
            }
        } else if let Some(limit) = self.limit_switch.as_mut() {
            if let EventPayload::Detach = event.payload {
                self.interlock.reset();
            }
            if let Some(state) = limit.handle_event(event) {
                self.on_limit_switch(state);
            }
        }
        true
    }

    /// Current homing phase, if homing
    pub fn homing_phase(&self) -> Option<HomingPhase> {
        self.state.phase()
    }
}
