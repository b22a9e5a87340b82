//! Digital channel abstractions
//!
//! Raw electrical state only; polarity is applied by the components built on
//! top of these traits.

use crate::channel::{Channel, ChannelError};

/// Digital input channel (switch, sensor)
pub trait DigitalInputChannel: Channel {
    /// Raw state reported by the hardware
    fn state(&self) -> Result<bool, ChannelError>;
}

/// Digital output channel (LED, relay)
pub trait DigitalOutputChannel: Channel {
    /// Raw state currently driven
    fn state(&self) -> Result<bool, ChannelError>;

    /// Drive a raw state
    fn set_state(&mut self, state: bool) -> Result<(), ChannelError>;
}
