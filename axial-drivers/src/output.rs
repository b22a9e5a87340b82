//! Polarity outputs and output banks
//!
//! An output bank drives a fixed set of outputs that live on one device, such
//! as the LEDs of an LED hub. Outputs are named `<bank>_<index>` and addressed
//! by channel index on the bank's device.

use core::fmt::Write;

use axial_core::config::OutputConfig;
use axial_hal::{ChannelError, ChannelEvent, ChannelHandle, DigitalOutputChannel, EventPayload};
use heapless::Vec;

use crate::component::{ChannelPort, Name};
use crate::composite::MAX_MEMBERS;
use crate::error::CompositeError;

/// Number of outputs on an LED hub
pub const LED_HUB_OUTPUTS: usize = 6;

/// Device label shared by LED hub outputs
pub const LED_HUB_LABEL: &str = "led_hub";

/// Output configuration for an LED hub
pub fn led_hub_config() -> OutputConfig {
    let mut config = OutputConfig::default();
    config.address = config.address.with_label(LED_HUB_LABEL);
    config
}

/// Digital output with polarity correction
pub struct PolarityOutput<O> {
    port: ChannelPort<O>,
    active_high: bool,
}

impl<O: DigitalOutputChannel> PolarityOutput<O> {
    pub fn new(name: &str, config: &OutputConfig, output: O) -> Self {
        Self {
            port: ChannelPort::new(name, config.address.clone(), output),
            active_high: config.active_high,
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

    pub fn port(&self) -> &ChannelPort<O> {
        &self.port
    }

    pub fn open(&mut self) -> Result<(), ChannelError> {
        self.port.open()
    }

    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.port.close()
    }

    pub fn on_attach(&mut self) -> Result<(), ChannelError> {
        self.port.attached()
    }

    /// Raw output state
    pub fn state(&self) -> Result<bool, ChannelError> {
        self.port.channel().state()
    }

    /// Drive a raw output state
    pub fn set_state(&mut self, state: bool) -> Result<(), ChannelError> {
        self.port.channel_mut().set_state(state)
    }

    /// Polarity-corrected state
    pub fn is_active(&self) -> Result<bool, ChannelError> {
        let raw = self.state()?;
        Ok(if self.active_high { raw } else { !raw })
    }

    /// Drive the output to its active level
    pub fn activate(&mut self) -> Result<(), ChannelError> {
        self.set_state(self.active_high)
    }

    /// Drive the output to its inactive level
    pub fn deactivate(&mut self) -> Result<(), ChannelError> {
        self.set_state(!self.active_high)
    }

    /// Process an event raised by this output's channel
    pub fn handle_event(&mut self, event: &ChannelEvent) -> bool {
        if !self.has_handle(event.handle) {
            return false;
        }
        match &event.payload {
            EventPayload::Attach => {
                if let Err(e) = self.on_attach() {
                    warn!("{} attach handling failed: {:?}", self.name(), e);
                }
            }
            payload => self.port.log_lifecycle(payload),
        }
        true
    }
}

/// A fixed set of outputs on one device
pub struct OutputBank<O> {
    name: Name,
    outputs: Vec<PolarityOutput<O>, MAX_MEMBERS>,
}

impl<O: DigitalOutputChannel> OutputBank<O> {
    /// Build a bank from its channels, in channel index order
    ///
    /// Each output uses `config` with its channel index filled in. Channels
    /// beyond [`MAX_MEMBERS`] are dropped.
    pub fn new(name: &str, config: &OutputConfig, channels: impl IntoIterator<Item = O>) -> Self {
        let mut outputs = Vec::new();
        for (index, channel) in channels.into_iter().enumerate() {
            let mut output_config = config.clone();
            if output_config.address.channel.is_none() {
                output_config.address.channel = Some(index as u8);
            }

            let mut output_name = Name::new();
            let _ = write!(output_name, "{}_{}", name, index);

            if outputs
                .push(PolarityOutput::new(&output_name, &output_config, channel))
                .is_err()
            {
                warn!("{}: output {} exceeds bank capacity", name, index);
                break;
            }
        }

        Self {
            name: crate::component::compose_name(&[name]),
            outputs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn output(&self, index: usize) -> Option<&PolarityOutput<O>> {
        self.outputs.get(index)
    }

    /// Open every output, attempting all of them
    pub fn open(&mut self) -> Result<(), CompositeError> {
        let mut errors = CompositeError::default();
        for output in self.outputs.iter_mut() {
            if let Err(e) = output.open() {
                errors.push(output.name(), e);
            }
        }
        errors.into_result()
    }

    /// Close every output, attempting all of them
    pub fn close(&mut self) -> Result<(), CompositeError> {
        let mut errors = CompositeError::default();
        for output in self.outputs.iter_mut() {
            if let Err(e) = output.close() {
                errors.push(output.name(), e);
            }
        }
        errors.into_result()
    }

    pub fn has_handle(&self, handle: ChannelHandle) -> bool {
        self.outputs.iter().any(|o| o.has_handle(handle))
    }

    /// Run the attach handler of the output owning `handle`
    pub fn dispatch_attach(&mut self, handle: ChannelHandle) -> bool {
        match self.outputs.iter_mut().find(|o| o.has_handle(handle)) {
            Some(output) => {
                if let Err(e) = output.on_attach() {
                    warn!("{} attach handling failed: {:?}", output.name(), e);
                }
                true
            }
            None => false,
        }
    }

    /// Check if every output is attached
    pub fn is_attached(&self) -> bool {
        self.outputs.iter().all(|o| o.is_attached())
    }

    /// Activate output `index`
    pub fn turn_on(&mut self, index: usize) -> Result<(), ChannelError> {
        self.outputs
            .get_mut(index)
            .ok_or(ChannelError::Unsupported)?
            .activate()
    }

    /// Deactivate output `index`
    pub fn turn_off(&mut self, index: usize) -> Result<(), ChannelError> {
        self.outputs
            .get_mut(index)
            .ok_or(ChannelError::Unsupported)?
            .deactivate()
    }

    /// Process an event if one of the bank's outputs raised it
    pub fn handle_event(&mut self, event: &ChannelEvent) -> bool {
        match event.payload {
            EventPayload::Attach => self.dispatch_attach(event.handle),
            _ => self.outputs.iter_mut().any(|o| o.handle_event(event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec as StdVec;

    use axial_hal::{ChannelHandle, EventQueue};
    use axial_hal_sim::{device, OutputModel, SimDigitalOutput, SimProbe};

    use super::*;

    fn led_hub(
        queue: &EventQueue,
    ) -> (
        OutputBank<SimDigitalOutput<'_>>,
        StdVec<SimProbe<'_, OutputModel>>,
    ) {
        let mut probes = StdVec::new();
        let mut channels = StdVec::new();
        for i in 0..LED_HUB_OUTPUTS {
            let mut dev = device(300, 0, i as u8, true);
            dev.label = Some(heapless::String::try_from(LED_HUB_LABEL).unwrap());
            let channel = SimDigitalOutput::new(ChannelHandle(100 + i as u32), queue, dev);
            probes.push(channel.probe());
            channels.push(channel);
        }
        let bank = OutputBank::new("status", &led_hub_config(), channels);
        (bank, probes)
    }

    fn drain<O: DigitalOutputChannel>(queue: &EventQueue, bank: &mut OutputBank<O>) {
        while let Some(event) = queue.next() {
            bank.handle_event(&event);
        }
    }

    #[test]
    fn test_outputs_named_and_addressed_by_index() {
        let queue: EventQueue = EventQueue::new();
        let (bank, _) = led_hub(&queue);

        assert_eq!(bank.len(), LED_HUB_OUTPUTS);
        let third = bank.output(2).unwrap();
        assert_eq!(third.name(), "status_2");
        assert_eq!(third.port().address().channel, Some(2));
        assert_eq!(
            third.port().address().label.as_deref(),
            Some(LED_HUB_LABEL)
        );
    }

    #[test]
    fn test_open_turn_on_off() {
        let queue: EventQueue = EventQueue::new();
        let (mut bank, probes) = led_hub(&queue);

        bank.open().unwrap();
        drain(&queue, &mut bank);
        assert!(bank.is_attached());

        bank.turn_on(4).unwrap();
        assert!(probes[4].raw());
        assert!(bank.output(4).unwrap().is_active().unwrap());

        bank.turn_off(4).unwrap();
        assert!(!probes[4].raw());

        assert_eq!(bank.turn_on(LED_HUB_OUTPUTS), Err(ChannelError::Unsupported));
    }

    #[test]
    fn test_active_low_output() {
        let queue: EventQueue = EventQueue::new();
        let channel = SimDigitalOutput::new(ChannelHandle(1), &queue, device(1, 0, 0, true));
        let probe = channel.probe();
        let config = OutputConfig {
            active_high: false,
            ..OutputConfig::default()
        };
        let mut output = PolarityOutput::new("relay", &config, channel);
        output.open().unwrap();

        output.activate().unwrap();
        assert!(!probe.raw());
        assert_eq!(output.is_active(), Ok(true));

        output.deactivate().unwrap();
        assert!(probe.raw());
        assert_eq!(output.is_active(), Ok(false));
    }

    #[test]
    fn test_attached_is_and_over_outputs() {
        let queue: EventQueue = EventQueue::new();
        let (mut bank, probes) = led_hub(&queue);
        bank.open().unwrap();
        assert!(bank.is_attached());

        probes[1].unplug();
        assert!(!bank.is_attached());
        assert!(bank.has_handle(ChannelHandle(101)));
        assert!(!bank.has_handle(ChannelHandle(99)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let queue: EventQueue = EventQueue::new();
        let (mut bank, probes) = led_hub(&queue);
        bank.open().unwrap();

        bank.close().unwrap();
        bank.close().unwrap();
        assert!(probes.iter().all(|p| !p.is_open() && p.events_cleared()));
    }
}
