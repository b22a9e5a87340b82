//! Configuration loading
//!
//! A joint configuration may come from a TOML document or from a binary
//! postcard blob. TOML is tried first; the binary form is the fallback.

use alloc::vec::Vec;

use super::types::{ConfigError, JointConfig, CONFIG_VERSION};

impl JointConfig {
    /// Encode as a versioned postcard blob
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Serialize)
    }

    /// Decode a versioned postcard blob
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: JointConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch {
                found: config.version,
                expected: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load a joint configuration
///
/// Tries the TOML document first (when the `toml` feature is enabled), then
/// falls back to the binary blob. The error of the last attempted source is
/// returned when neither yields a valid configuration.
pub fn load_joint_config(
    toml: Option<&str>,
    binary: Option<&[u8]>,
) -> Result<JointConfig, ConfigError> {
    let mut last_err = ConfigError::Deserialize;

    #[cfg(feature = "toml")]
    {
        if let Some(document) = toml {
            match super::toml::parse_joint_config(document) {
                Ok(config) => return Ok(config),
                Err(e) => last_err = e,
            }
        }
    }
    #[cfg(not(feature = "toml"))]
    let _ = toml;

    match binary {
        Some(bytes) => JointConfig::from_bytes(bytes),
        None => Err(last_err),
    }
}
