//! Simulated bridge input
//!
//! The sensor type is fixed to voltage ratio, so the sensor value equals the
//! voltage ratio. Change events honor the bridge state and both change
//! triggers.

use axial_hal::{Bounds, BridgeGain, ChannelError, EventPayload, VoltageRatioInputChannel};

use crate::check;
use crate::port::{SimChannel, SimModel, SimProbe};

/// State of a simulated bridge input
#[derive(Debug, Clone)]
pub struct VoltageRatioModel {
    /// Ratio the bridge currently measures
    pub voltage_ratio: f64,
    pub bridge_enabled: bool,
    pub bridge_gain: BridgeGain,
    pub data_interval: u32,
    pub voltage_ratio_change_trigger: f64,
    pub sensor_value_change_trigger: f64,
    pub data_interval_bounds: Bounds<u32>,
    pub voltage_ratio_bounds: Bounds<f64>,
    pub change_trigger_bounds: Bounds<f64>,
    reported_ratio: Option<f64>,
    reported_sensor: Option<f64>,
}

impl Default for VoltageRatioModel {
    fn default() -> Self {
        Self {
            voltage_ratio: 0.0,
            bridge_enabled: true,
            bridge_gain: BridgeGain::Gain128,
            data_interval: 256,
            voltage_ratio_change_trigger: 0.0,
            sensor_value_change_trigger: 0.0,
            data_interval_bounds: Bounds::new(8, 60_000),
            voltage_ratio_bounds: Bounds::new(-1.0, 1.0),
            change_trigger_bounds: Bounds::new(0.0, 1.0),
            reported_ratio: None,
            reported_sensor: None,
        }
    }
}

impl SimModel for VoltageRatioModel {
    // The measured ratio belongs to the world; everything else powers up fresh
    fn reset(&mut self) {
        *self = Self {
            voltage_ratio: self.voltage_ratio,
            ..Self::default()
        };
    }
}

/// A change is reported when it reaches the trigger, or on the first sample
fn crosses(reported: Option<f64>, value: f64, trigger: f64) -> bool {
    reported.map_or(true, |last| (value - last).abs() >= trigger)
}

/// Simulated voltage ratio input (load cell bridge)
pub type SimVoltageRatioInput<'q, const N: usize = { axial_hal::DEFAULT_QUEUE_DEPTH }> =
    SimChannel<'q, VoltageRatioModel, N>;

impl<'q, const N: usize> VoltageRatioInputChannel for SimChannel<'q, VoltageRatioModel, N> {
    fn bridge_enabled(&self) -> Result<bool, ChannelError> {
        self.query(|m| m.bridge_enabled)
    }

    fn set_bridge_enabled(&mut self, enabled: bool) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.bridge_enabled = enabled;
            Ok(())
        })
    }

    fn bridge_gain(&self) -> Result<BridgeGain, ChannelError> {
        self.query(|m| m.bridge_gain)
    }

    fn set_bridge_gain(&mut self, gain: BridgeGain) -> Result<(), ChannelError> {
        self.command(|m, _| {
            m.bridge_gain = gain;
            Ok(())
        })
    }

    fn data_interval(&self) -> Result<u32, ChannelError> {
        self.query(|m| m.data_interval)
    }

    fn set_data_interval(&mut self, interval_ms: u32) -> Result<(), ChannelError> {
        self.command(|m, _| {
            check(m.data_interval_bounds, interval_ms)?;
            m.data_interval = interval_ms;
            Ok(())
        })
    }

    fn data_interval_bounds(&self) -> Result<Bounds<u32>, ChannelError> {
        self.query(|m| m.data_interval_bounds)
    }

    fn voltage_ratio(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.voltage_ratio)
    }

    fn voltage_ratio_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.query(|m| m.voltage_ratio_bounds)
    }

    fn voltage_ratio_change_trigger(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.voltage_ratio_change_trigger)
    }

    fn set_voltage_ratio_change_trigger(&mut self, trigger: f64) -> Result<(), ChannelError> {
        self.command(|m, _| {
            check(m.change_trigger_bounds, trigger)?;
            m.voltage_ratio_change_trigger = trigger;
            Ok(())
        })
    }

    fn voltage_ratio_change_trigger_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.query(|m| m.change_trigger_bounds)
    }

    fn sensor_value(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.voltage_ratio)
    }

    fn sensor_value_change_trigger(&self) -> Result<f64, ChannelError> {
        self.query(|m| m.sensor_value_change_trigger)
    }

    fn set_sensor_value_change_trigger(&mut self, trigger: f64) -> Result<(), ChannelError> {
        self.command(|m, _| {
            check(m.change_trigger_bounds, trigger)?;
            m.sensor_value_change_trigger = trigger;
            Ok(())
        })
    }
}

impl<'q, const N: usize> SimProbe<'q, VoltageRatioModel, N> {
    /// Load the bridge
    ///
    /// With the bridge enabled, a change event is published for each
    /// quantity whose trigger the new ratio reaches.
    pub fn set_voltage_ratio(&self, ratio: f64) {
        self.update(|m, outbox| {
            m.voltage_ratio = ratio;
            if !m.bridge_enabled {
                return;
            }
            if crosses(m.reported_ratio, ratio, m.voltage_ratio_change_trigger) {
                m.reported_ratio = Some(ratio);
                outbox.push(EventPayload::VoltageRatioChange(ratio));
            }
            if crosses(m.reported_sensor, ratio, m.sensor_value_change_trigger) {
                m.reported_sensor = Some(ratio);
                outbox.push(EventPayload::SensorChange(ratio));
            }
        });
    }

    pub fn bridge_enabled(&self) -> bool {
        self.with_model(|m| m.bridge_enabled)
    }

    pub fn bridge_gain(&self) -> BridgeGain {
        self.with_model(|m| m.bridge_gain)
    }

    pub fn data_interval(&self) -> u32 {
        self.with_model(|m| m.data_interval)
    }

    pub fn voltage_ratio_change_trigger(&self) -> f64 {
        self.with_model(|m| m.voltage_ratio_change_trigger)
    }

    pub fn sensor_value_change_trigger(&self) -> f64 {
        self.with_model(|m| m.sensor_value_change_trigger)
    }
}

#[cfg(test)]
mod tests {
    use axial_hal::{Channel, ChannelEvent, ChannelHandle, EventKind, EventQueue};

    use super::*;
    use crate::{device, INVALID_ARGUMENT};

    fn open_bridge(
        queue: &EventQueue,
    ) -> (SimVoltageRatioInput<'_>, SimProbe<'_, VoltageRatioModel>) {
        let mut bridge =
            SimVoltageRatioInput::new(ChannelHandle(5), queue, device(300, 0, 0, false));
        let probe = bridge.probe();
        bridge.set_event_enabled(EventKind::VoltageRatioChange, true);
        bridge.open().unwrap();
        (bridge, probe)
    }

    fn ratio_event(ratio: f64) -> Option<ChannelEvent> {
        Some(ChannelEvent::new(
            ChannelHandle(5),
            EventPayload::VoltageRatioChange(ratio),
        ))
    }

    #[test]
    fn test_change_trigger_filters_small_changes() {
        let queue: EventQueue = EventQueue::new();
        let (mut bridge, probe) = open_bridge(&queue);
        bridge.set_voltage_ratio_change_trigger(0.1).unwrap();

        probe.set_voltage_ratio(0.2);
        assert_eq!(queue.next(), ratio_event(0.2));

        probe.set_voltage_ratio(0.25);
        assert!(queue.is_empty());

        probe.set_voltage_ratio(0.35);
        assert_eq!(queue.next(), ratio_event(0.35));
        // Sensor events were never enabled
        assert!(queue.is_empty());
    }

    #[test]
    fn test_disabled_bridge_is_silent() {
        let queue: EventQueue = EventQueue::new();
        let (mut bridge, probe) = open_bridge(&queue);
        bridge.set_bridge_enabled(false).unwrap();

        probe.set_voltage_ratio(0.5);
        assert!(queue.is_empty());
        assert_eq!(bridge.voltage_ratio(), Ok(0.5));
    }

    #[test]
    fn test_attach_restores_power_on_state() {
        let queue: EventQueue = EventQueue::new();
        let (mut bridge, probe) = open_bridge(&queue);
        bridge.set_bridge_gain(BridgeGain::Gain8).unwrap();
        bridge.set_data_interval(100).unwrap();
        probe.set_voltage_ratio(0.3);

        probe.unplug();
        probe.plug();
        assert_eq!(probe.bridge_gain(), BridgeGain::Gain128);
        assert_eq!(probe.data_interval(), 256);
        // The load is still there
        assert_eq!(bridge.voltage_ratio(), Ok(0.3));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let queue: EventQueue = EventQueue::new();
        let (mut bridge, _probe) = open_bridge(&queue);

        let rejected = Err(ChannelError::Hardware {
            code: INVALID_ARGUMENT,
        });
        assert_eq!(bridge.set_data_interval(4), rejected);
        assert_eq!(bridge.set_voltage_ratio_change_trigger(-0.1), rejected);
        assert_eq!(bridge.set_sensor_value_change_trigger(2.0), rejected);
    }
}
