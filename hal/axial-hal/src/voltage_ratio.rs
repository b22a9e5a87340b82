//! Voltage ratio input abstraction
//!
//! Bridge inputs for load cells and other ratiometric sensors. The voltage
//! ratio is the bridge output divided by its excitation voltage.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelError};
use crate::stepper::Bounds;

/// Bridge amplifier gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BridgeGain {
    #[default]
    Gain1,
    Gain2,
    Gain4,
    Gain8,
    Gain16,
    Gain32,
    Gain64,
    Gain128,
}

/// Voltage ratio input channel
///
/// Queries and commands fail with [`ChannelError::NotAttached`] while the
/// channel is detached. Change events are only raised while the bridge is
/// enabled.
pub trait VoltageRatioInputChannel: Channel {
    /// Check if the bridge is powered and sampling
    fn bridge_enabled(&self) -> Result<bool, ChannelError>;

    fn set_bridge_enabled(&mut self, enabled: bool) -> Result<(), ChannelError>;

    fn bridge_gain(&self) -> Result<BridgeGain, ChannelError>;

    fn set_bridge_gain(&mut self, gain: BridgeGain) -> Result<(), ChannelError>;

    /// Sample interval in milliseconds
    fn data_interval(&self) -> Result<u32, ChannelError>;

    fn set_data_interval(&mut self, interval_ms: u32) -> Result<(), ChannelError>;

    /// Accepted data interval range
    fn data_interval_bounds(&self) -> Result<Bounds<u32>, ChannelError>;

    /// Most recent voltage ratio
    fn voltage_ratio(&self) -> Result<f64, ChannelError>;

    /// Range the hardware can measure
    fn voltage_ratio_bounds(&self) -> Result<Bounds<f64>, ChannelError>;

    /// Minimum change that raises a voltage ratio event; zero reports every
    /// sample
    fn voltage_ratio_change_trigger(&self) -> Result<f64, ChannelError>;

    fn set_voltage_ratio_change_trigger(&mut self, trigger: f64) -> Result<(), ChannelError>;

    /// Accepted voltage ratio change trigger range
    fn voltage_ratio_change_trigger_bounds(&self) -> Result<Bounds<f64>, ChannelError>;

    /// Most recent reading converted by the sensor type
    fn sensor_value(&self) -> Result<f64, ChannelError>;

    /// Minimum change that raises a sensor event
    fn sensor_value_change_trigger(&self) -> Result<f64, ChannelError>;

    fn set_sensor_value_change_trigger(&mut self, trigger: f64) -> Result<(), ChannelError>;
}
