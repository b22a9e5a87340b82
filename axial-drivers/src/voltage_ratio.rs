//! Voltage ratio input
//!
//! A bridge input for load cells and similar sensors. Gain, data interval and
//! change triggers are re-applied on every attach; channels forget their
//! configuration when they detach.

use axial_core::config::VoltageRatioConfig;
use axial_hal::{
    Bounds, BridgeGain, ChannelError, ChannelEvent, ChannelHandle, EventKind, EventPayload,
    VoltageRatioInputChannel,
};

use crate::component::ChannelPort;
use crate::stepper::ValueHandler;

/// Bridge input with its configuration
pub struct VoltageRatioInput<V> {
    port: ChannelPort<V>,
    config: VoltageRatioConfig,
    on_voltage_ratio_change: Option<ValueHandler>,
    on_sensor_change: Option<ValueHandler>,
}

impl<V: VoltageRatioInputChannel> VoltageRatioInput<V> {
    pub fn new(name: &str, config: &VoltageRatioConfig, input: V) -> Self {
        Self {
            port: ChannelPort::new(name, config.address.clone(), input),
            config: config.clone(),
            on_voltage_ratio_change: None,
            on_sensor_change: None,
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

    pub fn port(&self) -> &ChannelPort<V> {
        &self.port
    }

    pub fn config(&self) -> &VoltageRatioConfig {
        &self.config
    }

    pub fn open(&mut self) -> Result<(), ChannelError> {
        self.port.open()
    }

    /// Drop both subscriptions, then release the channel
    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.set_on_voltage_ratio_change_handler(None);
        self.set_on_sensor_change_handler(None);
        self.port.close()
    }

    /// Attach handler: resolve the address and re-apply the configuration
    pub fn on_attach(&mut self) -> Result<(), ChannelError> {
        self.port.attached()?;

        self.set_bridge_gain(self.config.bridge_gain)?;
        self.set_data_interval(self.config.data_interval_ms)?;
        if let Some(trigger) = self.config.sensor_value_change_trigger {
            self.set_sensor_value_change_trigger(trigger)?;
        }
        if let Some(trigger) = self.config.voltage_ratio_change_trigger {
            self.set_voltage_ratio_change_trigger(trigger)?;
        }

        debug!(
            "{} configured: gain={:?} data_interval={}",
            self.name(),
            self.config.bridge_gain,
            self.config.data_interval_ms
        );
        Ok(())
    }

    fn channel(&self) -> &V {
        self.port.channel()
    }

    fn channel_mut(&mut self) -> &mut V {
        self.port.channel_mut()
    }

    // Bridge

    /// Power the bridge and start sampling
    pub fn enable(&mut self) -> Result<(), ChannelError> {
        self.channel_mut().set_bridge_enabled(true)
    }

    pub fn disable(&mut self) -> Result<(), ChannelError> {
        self.channel_mut().set_bridge_enabled(false)
    }

    pub fn is_enabled(&self) -> Result<bool, ChannelError> {
        self.channel().bridge_enabled()
    }

    pub fn bridge_gain(&self) -> Result<BridgeGain, ChannelError> {
        self.channel().bridge_gain()
    }

    pub fn set_bridge_gain(&mut self, gain: BridgeGain) -> Result<(), ChannelError> {
        self.channel_mut().set_bridge_gain(gain)
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

    // Readings

    pub fn voltage_ratio(&self) -> Result<f64, ChannelError> {
        self.channel().voltage_ratio()
    }

    pub fn voltage_ratio_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.channel().voltage_ratio_bounds()
    }

    pub fn voltage_ratio_change_trigger(&self) -> Result<f64, ChannelError> {
        self.channel().voltage_ratio_change_trigger()
    }

    pub fn set_voltage_ratio_change_trigger(&mut self, trigger: f64) -> Result<(), ChannelError> {
        self.channel_mut().set_voltage_ratio_change_trigger(trigger)
    }

    pub fn voltage_ratio_change_trigger_bounds(&self) -> Result<Bounds<f64>, ChannelError> {
        self.channel().voltage_ratio_change_trigger_bounds()
    }

    pub fn sensor_value(&self) -> Result<f64, ChannelError> {
        self.channel().sensor_value()
    }

    pub fn sensor_value_change_trigger(&self) -> Result<f64, ChannelError> {
        self.channel().sensor_value_change_trigger()
    }

    pub fn set_sensor_value_change_trigger(&mut self, trigger: f64) -> Result<(), ChannelError> {
        self.channel_mut().set_sensor_value_change_trigger(trigger)
    }

    // Subscriptions

    /// Replace the voltage ratio subscriber
    ///
    /// Safe before attachment; events only fire while attached.
    pub fn set_on_voltage_ratio_change_handler(&mut self, handler: Option<ValueHandler>) {
        self.port
            .set_event_enabled(EventKind::VoltageRatioChange, handler.is_some());
        self.on_voltage_ratio_change = handler;
    }

    /// Replace the sensor value subscriber
    pub fn set_on_sensor_change_handler(&mut self, handler: Option<ValueHandler>) {
        self.port
            .set_event_enabled(EventKind::SensorChange, handler.is_some());
        self.on_sensor_change = handler;
    }

    /// Process an event raised by this input's channel
    ///
    /// Returns false if the event belongs to another channel.
    pub fn handle_event(&mut self, event: &ChannelEvent) -> bool {
        if !self.has_handle(event.handle) {
            return false;
        }

        match event.payload {
            EventPayload::Attach => {
                if let Err(e) = self.on_attach() {
                    warn!("{} attach handling failed: {:?}", self.name(), e);
                }
            }
            EventPayload::VoltageRatioChange(ratio) => {
                if let Some(handler) = self.on_voltage_ratio_change.as_mut() {
                    handler(ratio);
                }
            }
            EventPayload::SensorChange(value) => {
                if let Some(handler) = self.on_sensor_change.as_mut() {
                    handler(value);
                }
            }
            ref payload => self.port.log_lifecycle(payload),
        }
        true
    }
}
