//! Configuration types
//!
//! Joint configuration is read from a TOML document or from a versioned
//! postcard blob (see [`loader`]).

pub mod types;

#[cfg(feature = "serde")]
pub mod loader;
#[cfg(feature = "toml")]
pub mod toml;

pub use types::*;

#[cfg(feature = "serde")]
pub use loader::load_joint_config;
