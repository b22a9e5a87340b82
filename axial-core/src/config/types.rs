//! Configuration type definitions

use core::fmt;

use axial_hal::{push_truncated, BridgeGain, ChannelAddress};
use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::Direction;

/// Maximum joint name length
pub const MAX_NAME_LEN: usize = 16;

/// Current binary config format version
pub const CONFIG_VERSION: u8 = 1;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML document could not be parsed
    TomlParse,
    /// Binary blob could not be decoded
    Deserialize,
    /// Config could not be encoded
    Serialize,
    /// Binary blob has an unsupported version
    VersionMismatch { found: u8, expected: u8 },
    /// A field holds an unusable value
    InvalidValue(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TomlParse => f.write_str("invalid TOML configuration"),
            ConfigError::Deserialize => f.write_str("invalid binary configuration"),
            ConfigError::Serialize => f.write_str("failed to encode configuration"),
            ConfigError::VersionMismatch { found, expected } => write!(
                f,
                "config version mismatch: found {}, expected {}",
                found, expected
            ),
            ConfigError::InvalidValue(field) => write!(f, "invalid value for `{}`", field),
        }
    }
}

/// Stepper motion settings
///
/// Applied to the hardware on every attach; channels forget their
/// configuration when they detach.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Position/velocity report interval in milliseconds
    pub data_interval_ms: u32,
    /// Units per step
    pub rescale_factor: f64,
    pub acceleration: f64,
    /// Cruising velocity limit (magnitude)
    pub velocity_limit: f64,
    /// Current limit in amps
    pub current_limit: f64,
    /// Holding current limit in amps
    pub holding_current_limit: f64,
    /// Treat hardware-negative as logical-positive
    pub invert_direction: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            data_interval_ms: 100,
            rescale_factor: 1.0,
            acceleration: 10_000.0,
            velocity_limit: 10_000.0,
            current_limit: 0.1,
            holding_current_limit: 0.0,
            invert_direction: false,
        }
    }
}

impl MotionConfig {
    /// Direction transform selected by `invert_direction`
    pub fn direction(&self) -> Direction {
        Direction::from_inverted(self.invert_direction)
    }

    /// Check values the hardware would reject or misbehave on
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("rescale_factor", self.rescale_factor)?;
        finite("acceleration", self.acceleration)?;
        finite("velocity_limit", self.velocity_limit)?;
        finite("current_limit", self.current_limit)?;
        finite("holding_current_limit", self.holding_current_limit)?;

        if self.rescale_factor <= 0.0 {
            return Err(ConfigError::InvalidValue("rescale_factor"));
        }
        if self.acceleration <= 0.0 {
            return Err(ConfigError::InvalidValue("acceleration"));
        }
        if self.velocity_limit < 0.0 {
            return Err(ConfigError::InvalidValue("velocity_limit"));
        }
        if self.current_limit < 0.0 {
            return Err(ConfigError::InvalidValue("current_limit"));
        }
        if self.holding_current_limit < 0.0 {
            return Err(ConfigError::InvalidValue("holding_current_limit"));
        }
        if self.data_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("data_interval_ms"));
        }
        Ok(())
    }
}

/// Stepper channel configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepperConfig {
    pub address: ChannelAddress,
    pub motion: MotionConfig,
}

/// Digital input (switch) configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SwitchConfig {
    pub address: ChannelAddress,
    /// Raw state `true` means active; otherwise raw `false` means active
    pub active_low: bool,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            address: ChannelAddress {
                is_hub_port_device: true,
                ..ChannelAddress::any()
            },
            active_low: true,
        }
    }
}

/// Digital output configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OutputConfig {
    pub address: ChannelAddress,
    /// Active drives the raw state high; otherwise active drives it low
    pub active_high: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            address: ChannelAddress {
                is_hub_port_device: true,
                ..ChannelAddress::any()
            },
            active_high: true,
        }
    }
}

/// Voltage ratio input (bridge) configuration
///
/// Applied on every attach. A trigger left unset keeps the hardware default.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VoltageRatioConfig {
    pub address: ChannelAddress,
    pub bridge_gain: BridgeGain,
    /// Sample interval in milliseconds
    pub data_interval_ms: u32,
    pub voltage_ratio_change_trigger: Option<f64>,
    pub sensor_value_change_trigger: Option<f64>,
}

impl Default for VoltageRatioConfig {
    fn default() -> Self {
        Self {
            address: ChannelAddress::any(),
            bridge_gain: BridgeGain::Gain1,
            data_interval_ms: 100,
            voltage_ratio_change_trigger: None,
            sensor_value_change_trigger: None,
        }
    }
}

impl VoltageRatioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("data_interval_ms"));
        }
        for (field, trigger) in [
            ("voltage_ratio_change_trigger", self.voltage_ratio_change_trigger),
            ("sensor_value_change_trigger", self.sensor_value_change_trigger),
        ] {
            if let Some(trigger) = trigger {
                finite(field, trigger)?;
                if trigger < 0.0 {
                    return Err(ConfigError::InvalidValue(field));
                }
            }
        }
        Ok(())
    }
}

/// What the joint does when its limit switch changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LimitSwitchMode {
    /// Limit switch events are ignored
    Disabled,
    /// Stop the actuator whenever the limit switch becomes active
    #[default]
    StopOnActive,
}

/// Stepper joint configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct JointConfig {
    /// Binary format version
    pub version: u8,
    /// Joint name, used in logs
    pub name: String<MAX_NAME_LEN>,
    pub stepper: StepperConfig,
    pub home_switch: SwitchConfig,
    /// Optional travel-limit switch
    pub limit_switch: Option<SwitchConfig>,
    /// Initial limit switch policy
    pub limit_switch_mode: LimitSwitchMode,
    /// Signed velocity used to approach the home switch
    pub home_velocity_limit: f64,
    /// Kept so existing configuration files still load; homing is driven
    /// by switch events and never reads it
    pub home_target_position: f64,
    /// Target used to move off the home switch when homing starts on it
    pub deactivate_home_switch_target_position: f64,
}

impl Default for JointConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            name: String::new(),
            stepper: StepperConfig::default(),
            home_switch: SwitchConfig::default(),
            limit_switch: None,
            limit_switch_mode: LimitSwitchMode::StopOnActive,
            home_velocity_limit: -1000.0,
            home_target_position: -10_000.0,
            deactivate_home_switch_target_position: 200.0,
        }
    }
}

impl JointConfig {
    /// Create a default config with a name
    ///
    /// Names longer than [`MAX_NAME_LEN`] are truncated.
    pub fn named(name: &str) -> Self {
        let mut config = Self::default();
        push_truncated(&mut config.name, name);
        config
    }

    /// Check the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stepper.motion.validate()?;
        finite("home_velocity_limit", self.home_velocity_limit)?;
        finite("home_target_position", self.home_target_position)?;
        finite(
            "deactivate_home_switch_target_position",
            self.deactivate_home_switch_target_position,
        )?;

        // A zero approach velocity never reaches the switch
        if self.home_velocity_limit == 0.0 {
            return Err(ConfigError::InvalidValue("home_velocity_limit"));
        }
        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_defaults() {
        let m = MotionConfig::default();
        assert_eq!(m.data_interval_ms, 100);
        assert_eq!(m.rescale_factor, 1.0);
        assert_eq!(m.acceleration, 10_000.0);
        assert_eq!(m.velocity_limit, 10_000.0);
        assert_eq!(m.current_limit, 0.1);
        assert_eq!(m.holding_current_limit, 0.0);
        assert!(!m.invert_direction);
        assert_eq!(m.direction(), Direction::Normal);
    }

    #[test]
    fn test_switch_and_output_defaults() {
        let s = SwitchConfig::default();
        assert!(s.active_low);
        assert!(s.address.is_hub_port_device);

        let o = OutputConfig::default();
        assert!(o.active_high);
        assert!(o.address.is_hub_port_device);
    }

    #[test]
    fn test_voltage_ratio_defaults_and_validation() {
        let v = VoltageRatioConfig::default();
        assert_eq!(v.bridge_gain, BridgeGain::Gain1);
        assert_eq!(v.data_interval_ms, 100);
        assert!(v.voltage_ratio_change_trigger.is_none());
        assert!(!v.address.is_hub_port_device);
        assert_eq!(v.validate(), Ok(()));

        let v = VoltageRatioConfig {
            sensor_value_change_trigger: Some(-0.01),
            ..VoltageRatioConfig::default()
        };
        assert_eq!(
            v.validate(),
            Err(ConfigError::InvalidValue("sensor_value_change_trigger"))
        );

        let v = VoltageRatioConfig {
            voltage_ratio_change_trigger: Some(f64::INFINITY),
            ..VoltageRatioConfig::default()
        };
        assert_eq!(
            v.validate(),
            Err(ConfigError::InvalidValue("voltage_ratio_change_trigger"))
        );
    }

    #[test]
    fn test_joint_defaults() {
        let j = JointConfig::named("shoulder");
        assert_eq!(j.name.as_str(), "shoulder");
        assert_eq!(j.version, CONFIG_VERSION);
        assert_eq!(j.home_velocity_limit, -1000.0);
        assert_eq!(j.home_target_position, -10_000.0);
        assert_eq!(j.deactivate_home_switch_target_position, 200.0);
        assert_eq!(j.limit_switch_mode, LimitSwitchMode::StopOnActive);
        assert!(j.limit_switch.is_none());
        assert!(!j.stepper.address.is_hub_port_device);
        assert_eq!(j.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut j = JointConfig::default();
        j.stepper.motion.rescale_factor = 0.0;
        assert_eq!(j.validate(), Err(ConfigError::InvalidValue("rescale_factor")));

        let mut j = JointConfig::default();
        j.stepper.motion.current_limit = -0.5;
        assert_eq!(j.validate(), Err(ConfigError::InvalidValue("current_limit")));

        let mut j = JointConfig::default();
        j.stepper.motion.data_interval_ms = 0;
        assert_eq!(j.validate(), Err(ConfigError::InvalidValue("data_interval_ms")));

        let mut j = JointConfig::default();
        j.home_velocity_limit = 0.0;
        assert_eq!(j.validate(), Err(ConfigError::InvalidValue("home_velocity_limit")));

        let mut j = JointConfig::default();
        j.deactivate_home_switch_target_position = f64::NAN;
        assert_eq!(
            j.validate(),
            Err(ConfigError::InvalidValue("deactivate_home_switch_target_position"))
        );
    }

    #[test]
    fn test_long_name_truncated() {
        let j = JointConfig::named("an_extremely_long_joint_name");
        assert_eq!(j.name.len(), MAX_NAME_LEN);
    }
}
