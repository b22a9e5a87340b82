//! TOML joint configuration
//!
//! Every key is optional and falls back to its default. Address tables
//! replace the whole default address, so switch and output addresses must
//! state `is_hub_port_device` when the device sits on a hub port.
//!
//! ```toml
//! name = "shoulder"
//! home_velocity_limit = -1500.0
//! limit_switch_mode = "stop_on_active"
//!
//! [stepper.address]
//! serial_number = 561234
//! hub_port = 0
//!
//! [stepper.motion]
//! velocity_limit = 20000.0
//! invert_direction = true
//!
//! [home_switch]
//! active_low = true
//!
//! [home_switch.address]
//! serial_number = 561234
//! hub_port = 1
//! is_hub_port_device = true
//! ```

use super::types::{ConfigError, JointConfig, VoltageRatioConfig};

/// Parse and validate a TOML joint configuration
pub fn parse_joint_config(input: &str) -> Result<JointConfig, ConfigError> {
    let config: JointConfig = ::toml::from_str(input).map_err(|_| ConfigError::TomlParse)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a TOML bridge input configuration
///
/// ```toml
/// bridge_gain = "gain64"
/// data_interval_ms = 50
/// voltage_ratio_change_trigger = 0.001
/// ```
pub fn parse_voltage_ratio_config(input: &str) -> Result<VoltageRatioConfig, ConfigError> {
    let config: VoltageRatioConfig =
        ::toml::from_str(input).map_err(|_| ConfigError::TomlParse)?;
    config.validate()?;
    Ok(config)
}
