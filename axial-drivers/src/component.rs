//! Plumbing shared by every channel-backed component
//!
//! A [`ChannelPort`] owns one hardware channel together with its address and
//! display name, and handles the lifecycle common to all leaves: open with
//! optional attachment wait, attach-time address resolution, detach and error
//! logging, and close with event delivery cleared first.

use axial_hal::{
    push_truncated, Channel, ChannelAddress, ChannelError, ChannelHandle, EventKind, EventPayload,
};
use heapless::String;

/// Maximum component name length
pub const MAX_NAME_LEN: usize = 32;

/// Component display name
pub type Name = String<MAX_NAME_LEN>;

/// Build a name from parts, truncating at [`MAX_NAME_LEN`]
pub(crate) fn compose_name(parts: &[&str]) -> Name {
    let mut name = Name::new();
    for part in parts {
        push_truncated(&mut name, part);
    }
    name
}

/// Occupant of a single-slot event subscription
///
/// `Owner` routes the event to the component that owns this one (the joint
/// coordinator), which receives it as the return value of `handle_event`.
pub enum Subscriber<F> {
    Owner,
    Callback(F),
}

/// One hardware channel with its address and name
pub struct ChannelPort<C> {
    name: Name,
    channel: C,
    address: ChannelAddress,
}

impl<C: Channel> ChannelPort<C> {
    pub fn new(name: &str, address: ChannelAddress, channel: C) -> Self {
        Self {
            name: compose_name(&[name]),
            channel,
            address,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> ChannelHandle {
        self.channel.handle()
    }

    pub fn has_handle(&self, handle: ChannelHandle) -> bool {
        self.channel.handle() == handle
    }

    pub fn is_attached(&self) -> bool {
        self.channel.is_attached()
    }

    /// Address, with "any" placeholders resolved once attached
    pub fn address(&self) -> &ChannelAddress {
        &self.address
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Fail with `NotAttached` unless the channel is attached
    pub fn require_attached(&self) -> Result<(), ChannelError> {
        if self.channel.is_attached() {
            Ok(())
        } else {
            Err(ChannelError::NotAttached)
        }
    }

    /// Open the channel
    ///
    /// Blocks for attachment when the address carries a timeout.
    pub fn open(&mut self) -> Result<(), ChannelError> {
        self.channel.set_address(&self.address);
        for kind in [EventKind::Attach, EventKind::Detach, EventKind::Error] {
            self.channel.set_event_enabled(kind, true);
        }

        let result = match self.address.attach_timeout_ms {
            Some(timeout_ms) => {
                debug!("{} waiting {} ms for attachment", self.name.as_str(), timeout_ms);
                self.channel.open_wait_for_attachment(timeout_ms)
            }
            None => self.channel.open(),
        };

        if let Err(e) = result {
            error!("{} failed to open: {:?}", self.name.as_str(), e);
        }
        result
    }

    /// Clear event delivery, then close the channel
    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.channel.clear_events();
        self.channel.close()
    }

    /// Enable or disable delivery of one event kind
    pub fn set_event_enabled(&mut self, kind: EventKind, enabled: bool) {
        self.channel.set_event_enabled(kind, enabled);
    }

    /// Resolve the address from the attached device and log its identity
    pub fn attached(&mut self) -> Result<(), ChannelError> {
        let device = self.channel.attached_device()?;
        self.address.resolve(&device);

        match device.label.as_ref() {
            Some(label) => info!(
                "{} -> label: {}, hub_port: {}",
                self.name.as_str(),
                label.as_str(),
                device.hub_port
            ),
            None => info!(
                "{} -> serial_number: {}, hub_port: {}",
                self.name.as_str(),
                device.serial_number,
                device.hub_port
            ),
        }
        Ok(())
    }

    /// Log detach and error events
    pub fn log_lifecycle(&self, payload: &EventPayload) {
        match payload {
            EventPayload::Detach => info!("{} detached", self.name.as_str()),
            EventPayload::Error { code, description } => error!(
                "{} error {}: {}",
                self.name.as_str(),
                code,
                description.as_str()
            ),
            _ => {}
        }
    }
}
