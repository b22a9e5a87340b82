//! Simulated digital channels

use axial_hal::{ChannelError, DigitalInputChannel, DigitalOutputChannel, EventPayload};

use crate::port::{SimChannel, SimModel, SimProbe};

/// Raw state of a simulated input
#[derive(Debug, Clone, Default)]
pub struct InputModel {
    /// Electrical state of the input
    pub raw: bool,
}

impl SimModel for InputModel {
    // The input follows the physical world, not the channel configuration
    fn reset(&mut self) {}
}

/// Simulated digital input (limit or home switch)
pub type SimDigitalInput<'q, const N: usize = { axial_hal::DEFAULT_QUEUE_DEPTH }> =
    SimChannel<'q, InputModel, N>;

impl<'q, const N: usize> DigitalInputChannel for SimChannel<'q, InputModel, N> {
    fn state(&self) -> Result<bool, ChannelError> {
        self.query(|m| m.raw)
    }
}

impl<'q, const N: usize> SimProbe<'q, InputModel, N> {
    /// Drive the raw input level
    ///
    /// A `StateChange` event is published only when the level changes.
    pub fn set_raw(&self, raw: bool) {
        self.update(|m, outbox| {
            if m.raw != raw {
                m.raw = raw;
                outbox.push(EventPayload::StateChange(raw));
            }
        });
    }

    pub fn raw(&self) -> bool {
        self.with_model(|m| m.raw)
    }
}

/// Raw state of a simulated output
#[derive(Debug, Clone, Default)]
pub struct OutputModel {
    /// Electrical state driven by the channel
    pub raw: bool,
    /// Number of `set_state` calls
    pub writes: usize,
}

impl SimModel for OutputModel {
    fn reset(&mut self) {
        self.raw = false;
    }
}

/// Simulated digital output (LED, relay)
pub type SimDigitalOutput<'q, const N: usize = { axial_hal::DEFAULT_QUEUE_DEPTH }> =
    SimChannel<'q, OutputModel, N>;

impl<'q, const N: usize> DigitalOutputChannel for SimChannel<'q, OutputModel, N> {
    fn state(&self) -> Result<bool, ChannelError> {
        self.query(|m| m.raw)
    }

    fn set_state(&mut self, state: bool) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.raw = state;
            m.writes += 1;
            Ok(())
        })
    }
}

impl<'q, const N: usize> SimProbe<'q, OutputModel, N> {
    pub fn raw(&self) -> bool {
        self.with_model(|m| m.raw)
    }
}

#[cfg(test)]
mod tests {
    use axial_hal::{Channel, ChannelEvent, ChannelHandle, EventKind, EventQueue};

    use super::*;
    use crate::device;

    #[test]
    fn test_input_events_only_while_attached() {
        let queue: EventQueue = EventQueue::new();
        let mut input = SimDigitalInput::new(ChannelHandle(7), &queue, device(1, 0, 0, false));
        let probe = input.probe();
        input.set_event_enabled(EventKind::StateChange, true);

        // Not open yet: no event, but the level is remembered
        probe.set_raw(true);
        assert!(queue.is_empty());
        assert_eq!(input.state(), Err(ChannelError::NotAttached));

        input.open().unwrap();
        assert_eq!(input.state(), Ok(true));

        probe.set_raw(false);
        assert_eq!(
            queue.next(),
            Some(ChannelEvent::new(ChannelHandle(7), EventPayload::StateChange(false)))
        );

        // Same level again is not a change
        probe.set_raw(false);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_output_reset_on_attach() {
        let queue: EventQueue = EventQueue::new();
        let mut output = SimDigitalOutput::new(ChannelHandle(8), &queue, device(1, 1, 0, false));
        let probe = output.probe();

        output.open().unwrap();
        output.set_state(true).unwrap();
        assert!(probe.raw());

        probe.unplug();
        assert_eq!(output.set_state(true), Err(ChannelError::NotAttached));
        probe.plug();
        assert!(!probe.raw());
    }

    #[test]
    fn test_open_wait_times_out_on_mismatch() {
        let queue: EventQueue = EventQueue::new();
        let mut input = SimDigitalInput::new(ChannelHandle(9), &queue, device(1, 2, 0, true));
        let probe = input.probe();

        input.set_address(&axial_hal::ChannelAddress::hub_port_device(3));
        assert_eq!(input.open_wait_for_attachment(100), Err(ChannelError::Timeout));
        assert!(!probe.is_open());
        assert!(!input.is_attached());
    }
}
