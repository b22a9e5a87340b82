//! Channel lifecycle
//!
//! Every hardware channel goes through the same lifecycle: configure the
//! address, open (asynchronously or waiting for attachment), any number of
//! attach/detach cycles reported through events, then close.

use core::fmt;

use crate::address::{AttachedDevice, ChannelAddress, ChannelHandle};
use crate::event::EventKind;

/// Errors reported by the hardware-access library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// The channel is not attached; commands and queries are unavailable
    NotAttached,
    /// Waiting for attachment exceeded the configured timeout
    Timeout,
    /// The channel has been closed
    Closed,
    /// The channel does not support the requested operation
    Unsupported,
    /// Hardware-level failure with a vendor error code
    Hardware {
        /// Vendor error code
        code: i32,
    },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::NotAttached => f.write_str("channel not attached"),
            ChannelError::Timeout => f.write_str("timed out waiting for attachment"),
            ChannelError::Closed => f.write_str("channel closed"),
            ChannelError::Unsupported => f.write_str("operation not supported by channel"),
            ChannelError::Hardware { code } => write!(f, "hardware error (code {})", code),
        }
    }
}

/// A hardware channel
///
/// Implementations wrap one channel object of the hardware-access library.
/// Event callbacks of the library must be forwarded as
/// [`ChannelEvent`](crate::event::ChannelEvent)s carrying [`Channel::handle`],
/// but only for event kinds enabled with [`Channel::set_event_enabled`].
pub trait Channel {
    /// Stable identity of this channel
    fn handle(&self) -> ChannelHandle;

    /// Configure which physical channel to open
    ///
    /// Must be called before `open`; has no effect on an open channel.
    fn set_address(&mut self, address: &ChannelAddress);

    /// Open the channel without waiting
    ///
    /// Attachment is reported later through an `Attach` event.
    fn open(&mut self) -> Result<(), ChannelError>;

    /// Open the channel and block until it attaches
    ///
    /// Returns [`ChannelError::Timeout`] if the channel does not attach
    /// within `timeout_ms`. The `Attach` event is still delivered.
    fn open_wait_for_attachment(&mut self, timeout_ms: u32) -> Result<(), ChannelError>;

    /// Release the channel
    ///
    /// Safe to call repeatedly. Callers clear event delivery first.
    fn close(&mut self) -> Result<(), ChannelError>;

    /// Check if the channel is currently attached
    fn is_attached(&self) -> bool;

    /// Identity reported by the attached hardware
    fn attached_device(&self) -> Result<AttachedDevice, ChannelError>;

    /// Enable or disable delivery of one event kind
    ///
    /// Registering before attachment is allowed; events only fire while
    /// attached.
    fn set_event_enabled(&mut self, kind: EventKind, enabled: bool);

    /// Disable delivery of every event kind
    fn clear_events(&mut self) {
        for kind in EventKind::ALL {
            self.set_event_enabled(kind, false);
        }
    }
}
