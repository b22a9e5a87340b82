//! Device composite
//!
//! Presents a set of channel-backed components as one dispatch target for
//! attach events and readiness queries. Members are borrowed, not owned: the
//! composite is a registration built over components whose lifetime belongs
//! to someone else (typically the joint coordinator).
//!
//! Only two leaf kinds exist, so membership is a closed enum rather than a
//! trait object.

use axial_hal::{ChannelError, ChannelHandle, DigitalInputChannel, StepperChannel};
use heapless::Vec;

use crate::error::CompositeError;
use crate::stepper::DirectionStepper;
use crate::switch::PolaritySwitch;

/// Maximum number of members in a composite
pub const MAX_MEMBERS: usize = 8;

/// A registered component
pub enum Member<'a, S, I> {
    Actuator(&'a mut DirectionStepper<S>),
    Switch(&'a mut PolaritySwitch<I>),
}

impl<S: StepperChannel, I: DigitalInputChannel> Member<'_, S, I> {
    pub fn name(&self) -> &str {
        match self {
            Member::Actuator(m) => m.name(),
            Member::Switch(m) => m.name(),
        }
    }

    pub fn has_handle(&self, handle: ChannelHandle) -> bool {
        match self {
            Member::Actuator(m) => m.has_handle(handle),
            Member::Switch(m) => m.has_handle(handle),
        }
    }

    pub fn is_attached(&self) -> bool {
        match self {
            Member::Actuator(m) => m.is_attached(),
            Member::Switch(m) => m.is_attached(),
        }
    }

    pub fn on_attach(&mut self) -> Result<(), ChannelError> {
        match self {
            Member::Actuator(m) => m.on_attach(),
            Member::Switch(m) => m.on_attach(),
        }
    }

    pub fn open(&mut self) -> Result<(), ChannelError> {
        match self {
            Member::Actuator(m) => m.open(),
            Member::Switch(m) => m.open(),
        }
    }

    pub fn close(&mut self) -> Result<(), ChannelError> {
        match self {
            Member::Actuator(m) => m.close(),
            Member::Switch(m) => m.close(),
        }
    }
}

/// Registration of components, in insertion order
pub struct Composite<'a, S, I> {
    members: Vec<Member<'a, S, I>, MAX_MEMBERS>,
}

impl<S, I> Default for Composite<'_, S, I> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<'a, S: StepperChannel, I: DigitalInputChannel> Composite<'a, S, I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member
    ///
    /// Hands the member back if the composite is full.
    pub fn add(&mut self, member: Member<'a, S, I>) -> Result<(), Member<'a, S, I>> {
        self.members.push(member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if any member owns `handle`
    pub fn has_handle(&self, handle: ChannelHandle) -> bool {
        self.members.iter().any(|m| m.has_handle(handle))
    }

    /// Forward an attach to the first member owning `handle`
    ///
    /// Returns false when no member matches; the event belongs to someone
    /// else. A failing attach handler is logged, not propagated.
    pub fn dispatch_attach(&mut self, handle: ChannelHandle) -> bool {
        let Some(member) = self.members.iter_mut().find(|m| m.has_handle(handle)) else {
            return false;
        };
        if let Err(e) = member.on_attach() {
            warn!("{} attach handling failed: {:?}", member.name(), e);
        }
        true
    }

    /// Every member attached
    ///
    /// An empty composite is attached.
    pub fn is_attached(&self) -> bool {
        self.members.iter().all(|m| m.is_attached())
    }

    /// Open every member, collecting failures
    pub fn open(&mut self) -> Result<(), CompositeError> {
        let mut errors = CompositeError::default();
        for member in self.members.iter_mut() {
            if let Err(e) = member.open() {
                errors.push(member.name(), e);
            }
        }
        errors.into_result()
    }

    /// Close every member, collecting failures
    pub fn close(&mut self) -> Result<(), CompositeError> {
        let mut errors = CompositeError::default();
        for member in self.members.iter_mut() {
            if let Err(e) = member.close() {
                error!("{} failed to close: {:?}", member.name(), e);
                errors.push(member.name(), e);
            }
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use axial_core::config::{StepperConfig, SwitchConfig};
    use axial_hal::{ChannelAddress, EventQueue};
    use axial_hal_sim::{device, SimDigitalInput, SimStepper};

    use super::*;

    fn switch_config() -> SwitchConfig {
        SwitchConfig {
            address: ChannelAddress::any(),
            ..SwitchConfig::default()
        }
    }

    #[test]
    fn test_empty_composite_is_attached() {
        let composite: Composite<'_, SimStepper<'_>, SimDigitalInput<'_>> = Composite::new();
        assert!(composite.is_empty());
        assert!(composite.is_attached());
        assert!(!composite.has_handle(ChannelHandle(1)));
    }

    #[test]
    fn test_dispatch_by_handle() {
        let queue: EventQueue = EventQueue::new();
        let mut stepper = DirectionStepper::new(
            "stepper",
            &StepperConfig::default(),
            SimStepper::new(ChannelHandle(1), &queue, device(10, 0, 0, false)),
        );
        let mut home = PolaritySwitch::new(
            "home",
            &switch_config(),
            SimDigitalInput::new(ChannelHandle(2), &queue, device(11, 0, 0, false)),
        );
        let stepper_probe = stepper.port().channel().probe();
        stepper.open().unwrap();
        home.open().unwrap();
        queue.clear();

        let mut composite = Composite::new();
        assert!(composite.add(Member::Actuator(&mut stepper)).is_ok());
        assert!(composite.add(Member::Switch(&mut home)).is_ok());

        assert!(composite.has_handle(ChannelHandle(1)));
        assert!(composite.has_handle(ChannelHandle(2)));
        assert!(!composite.has_handle(ChannelHandle(3)));
        assert!(composite.is_attached());

        // Unmatched handle is ignored
        assert!(!composite.dispatch_attach(ChannelHandle(3)));
        assert!(!stepper_probe.engaged());

        // Only the stepper's attach handler runs
        assert!(composite.dispatch_attach(ChannelHandle(1)));
        drop(composite);
        assert!(stepper_probe.engaged());
        assert_eq!(home.port().address().serial_number, None);
    }

    #[test]
    fn test_not_attached_until_every_member_is() {
        let queue: EventQueue = EventQueue::new();
        let mut stepper = DirectionStepper::new(
            "stepper",
            &StepperConfig::default(),
            SimStepper::new(ChannelHandle(1), &queue, device(10, 0, 0, false)),
        );
        let home_channel = SimDigitalInput::new(ChannelHandle(2), &queue, device(11, 0, 0, false));
        let home_probe = home_channel.probe();
        home_probe.unplug();
        let mut home = PolaritySwitch::new("home", &switch_config(), home_channel);

        let mut composite = Composite::new();
        assert!(composite.add(Member::Actuator(&mut stepper)).is_ok());
        assert!(composite.add(Member::Switch(&mut home)).is_ok());
        composite.open().unwrap();
        assert!(!composite.is_attached());

        home_probe.plug();
        assert!(composite.is_attached());
    }

    #[test]
    fn test_open_failure_does_not_short_circuit() {
        let queue: EventQueue = EventQueue::new();
        let mut stepper_config = StepperConfig::default();
        stepper_config.address.attach_timeout_ms = Some(100);
        let stepper_channel = SimStepper::new(ChannelHandle(1), &queue, device(10, 0, 0, false));
        stepper_channel.probe().unplug();
        let mut stepper = DirectionStepper::new("stepper", &stepper_config, stepper_channel);
        let home_channel = SimDigitalInput::new(ChannelHandle(2), &queue, device(11, 0, 0, false));
        let home_probe = home_channel.probe();
        let mut home = PolaritySwitch::new("home", &switch_config(), home_channel);

        let mut composite = Composite::new();
        assert!(composite.add(Member::Actuator(&mut stepper)).is_ok());
        assert!(composite.add(Member::Switch(&mut home)).is_ok());

        let err = composite.open().unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert!(err.contains("stepper"));
        assert_eq!(err.first().map(|f| f.error), Some(ChannelError::Timeout));
        // The switch was still opened
        assert!(home_probe.is_open());
    }

    #[test]
    fn test_close_reaches_every_member() {
        let queue: EventQueue = EventQueue::new();
        let mut stepper = DirectionStepper::new(
            "stepper",
            &StepperConfig::default(),
            SimStepper::new(ChannelHandle(1), &queue, device(10, 0, 0, false)),
        );
        let home_channel = SimDigitalInput::new(ChannelHandle(2), &queue, device(11, 0, 0, false));
        let home_probe = home_channel.probe();
        let mut home = PolaritySwitch::new("home", &switch_config(), home_channel);

        let mut composite = Composite::new();
        assert!(composite.add(Member::Actuator(&mut stepper)).is_ok());
        assert!(composite.add(Member::Switch(&mut home)).is_ok());
        composite.open().unwrap();
        composite.close().unwrap();

        assert!(!home_probe.is_open());
        assert!(home_probe.events_cleared());
        // Idempotent
        composite.close().unwrap();
    }
}
