//! Polarity switch
//!
//! A digital input with configurable polarity. With `active_low` set the raw
//! state reported by the channel is taken as the active state directly;
//! otherwise the raw state is inverted.

use alloc::boxed::Box;

use axial_core::config::SwitchConfig;
use axial_hal::{ChannelError, ChannelEvent, ChannelHandle, DigitalInputChannel, EventKind, EventPayload};

use crate::component::{ChannelPort, Subscriber};

/// A switch reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchState {
    /// Raw state reported by the channel
    pub raw: bool,
    /// Polarity-corrected state
    pub active: bool,
}

/// State-change callback
pub type StateChangeHandler = Box<dyn FnMut(SwitchState)>;

/// Digital input with polarity correction
pub struct PolaritySwitch<I> {
    port: ChannelPort<I>,
    active_low: bool,
    on_state_change: Option<Subscriber<StateChangeHandler>>,
}

impl<I: DigitalInputChannel> PolaritySwitch<I> {
    pub fn new(name: &str, config: &SwitchConfig, input: I) -> Self {
        Self {
            port: ChannelPort::new(name, config.address.clone(), input),
            active_low: config.active_low,
            on_state_change: None,
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

    pub fn port(&self) -> &ChannelPort<I> {
        &self.port
    }

    pub fn open(&mut self) -> Result<(), ChannelError> {
        self.port.open()
    }

    /// Drop the subscription, then release the channel
    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.on_state_change = None;
        self.port.close()
    }

    /// Attach handler: resolve the address and log the device
    pub fn on_attach(&mut self) -> Result<(), ChannelError> {
        self.port.attached()
    }

    /// Raw channel state
    pub fn state(&self) -> Result<bool, ChannelError> {
        self.port.channel().state()
    }

    /// Polarity-corrected state
    pub fn is_active(&self) -> Result<bool, ChannelError> {
        Ok(self.polarity(self.state()?))
    }

    /// Map a raw state to active/inactive
    pub fn polarity(&self, raw: bool) -> bool {
        if self.active_low {
            raw
        } else {
            !raw
        }
    }

    /// Replace the state-change subscriber
    ///
    /// Safe before attachment; events only fire while attached.
    pub fn set_on_state_change_handler(&mut self, handler: Option<StateChangeHandler>) {
        self.subscribe(handler.map(Subscriber::Callback));
    }

    /// Route state changes to the owning coordinator
    pub(crate) fn subscribe_owner(&mut self, subscribed: bool) {
        self.subscribe(subscribed.then_some(Subscriber::Owner));
    }

    fn subscribe(&mut self, subscriber: Option<Subscriber<StateChangeHandler>>) {
        self.port
            .set_event_enabled(EventKind::StateChange, subscriber.is_some());
        self.on_state_change = subscriber;
    }

    /// Process an event raised by this switch's channel
    ///
    /// Returns the new state when the owner is subscribed.
    pub fn handle_event(&mut self, event: &ChannelEvent) -> Option<SwitchState> {
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
            EventPayload::StateChange(raw) => {
                let state = SwitchState {
                    raw,
                    active: self.polarity(raw),
                };
                trace!("{} state raw={} active={}", self.name(), raw, state.active);

                match self.on_state_change.as_mut() {
                    Some(Subscriber::Owner) => Some(state),
                    Some(Subscriber::Callback(handler)) => {
                        handler(state);
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

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use axial_hal::{ChannelHandle, EventQueue};
    use axial_hal_sim::{device, SimDigitalInput};
    use proptest::prelude::*;

    use super::*;

    fn drain<I: DigitalInputChannel>(
        queue: &EventQueue,
        switch: &mut PolaritySwitch<I>,
    ) -> Vec<SwitchState> {
        let mut out = Vec::new();
        while let Some(event) = queue.next() {
            out.extend(switch.handle_event(&event));
        }
        out
    }

    fn config(active_low: bool) -> SwitchConfig {
        SwitchConfig {
            active_low,
            ..SwitchConfig::default()
        }
    }

    #[test]
    fn test_polarity_both_branches() {
        let queue: EventQueue = EventQueue::new();
        for (active_low, raw, expected) in [
            (true, true, true),
            (true, false, false),
            (false, true, false),
            (false, false, true),
        ] {
            let input = SimDigitalInput::new(ChannelHandle(1), &queue, device(1, 0, 0, true));
            let probe = input.probe();
            let mut switch = PolaritySwitch::new("home", &config(active_low), input);
            switch.open().unwrap();
            probe.set_raw(raw);

            assert_eq!(switch.is_active(), Ok(expected));
        }
    }

    #[test]
    fn test_detached_switch_reports_error() {
        let queue: EventQueue = EventQueue::new();
        let input = SimDigitalInput::new(ChannelHandle(1), &queue, device(1, 0, 0, true));
        let switch = PolaritySwitch::new("home", &config(true), input);
        assert_eq!(switch.is_active(), Err(ChannelError::NotAttached));
    }

    #[test]
    fn test_owner_subscription_returns_state() {
        let queue: EventQueue = EventQueue::new();
        let input = SimDigitalInput::new(ChannelHandle(3), &queue, device(1, 0, 0, true));
        let probe = input.probe();
        let mut switch = PolaritySwitch::new("home", &config(false), input);
        switch.subscribe_owner(true);
        switch.open().unwrap();

        probe.set_raw(true);
        assert_eq!(
            drain(&queue, &mut switch),
            [SwitchState {
                raw: true,
                active: false
            }]
        );
    }

    #[test]
    fn test_callback_replaced_not_stacked() {
        let queue: EventQueue = EventQueue::new();
        let input = SimDigitalInput::new(ChannelHandle(4), &queue, device(1, 0, 0, true));
        let probe = input.probe();
        let mut switch = PolaritySwitch::new("home", &config(true), input);

        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let sink = first.clone();
        switch.set_on_state_change_handler(Some(Box::new(move |s: SwitchState| {
            sink.borrow_mut().push(s)
        })));
        let sink = second.clone();
        switch.set_on_state_change_handler(Some(Box::new(move |s: SwitchState| {
            sink.borrow_mut().push(s)
        })));
        switch.open().unwrap();

        probe.set_raw(true);
        // Callbacks consume the event; nothing is returned to an owner
        assert!(drain(&queue, &mut switch).is_empty());
        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);

        switch.set_on_state_change_handler(None);
        assert!(!probe.event_enabled(EventKind::StateChange));
        probe.set_raw(false);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_attach_resolves_address() {
        let queue: EventQueue = EventQueue::new();
        let input = SimDigitalInput::new(ChannelHandle(5), &queue, device(4242, 3, 0, true));
        let mut switch = PolaritySwitch::new("home", &config(true), input);
        switch.open().unwrap();
        drain(&queue, &mut switch);

        assert_eq!(switch.port().address().serial_number, Some(4242));
        assert_eq!(switch.port().address().hub_port, Some(3));
    }

    #[test]
    fn test_close_clears_everything() {
        let queue: EventQueue = EventQueue::new();
        let input = SimDigitalInput::new(ChannelHandle(6), &queue, device(1, 0, 0, true));
        let probe = input.probe();
        let mut switch = PolaritySwitch::new("home", &config(true), input);
        switch.subscribe_owner(true);
        switch.open().unwrap();

        switch.close().unwrap();
        assert!(probe.events_cleared());
        assert!(!probe.is_open());
        // Idempotent
        switch.close().unwrap();
    }

    proptest! {
        #[test]
        fn prop_polarity_matches_convention(active_low in any::<bool>(), raw in any::<bool>()) {
            let queue: EventQueue = EventQueue::new();
            let input = SimDigitalInput::new(ChannelHandle(9), &queue, device(1, 0, 0, true));
            let switch = PolaritySwitch::new("p", &config(active_low), input);
            prop_assert_eq!(switch.polarity(raw), if active_low { raw } else { !raw });
        }
    }
}
