//! Channel addressing
//!
//! A channel is located by device serial number, device label, channel index
//! and hub port. Any of these may be left as "any" (`None`); the hardware
//! reports the concrete values once the channel attaches.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum device label length
pub const MAX_LABEL_LEN: usize = 16;

/// Opaque identity of one hardware channel
///
/// Handles are assigned by the hardware-access library and stay stable for
/// the lifetime of the channel object, across detach/reattach cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelHandle(pub u32);

/// Where to find a hardware channel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelAddress {
    /// Device serial number (`None` = any)
    pub serial_number: Option<i32>,
    /// Device label (`None` = any)
    pub label: Option<String<MAX_LABEL_LEN>>,
    /// Channel index on the device (`None` = any)
    pub channel: Option<u8>,
    /// Hub port the device is plugged into (`None` = any)
    pub hub_port: Option<u8>,
    /// The device is itself a hub port (digital I/O wired directly to a
    /// hub port) rather than a device addressed by channel
    pub is_hub_port_device: bool,
    /// Block in `open` until attached, for at most this many milliseconds.
    /// `None` opens asynchronously.
    pub attach_timeout_ms: Option<u32>,
}

impl ChannelAddress {
    /// Address matching any channel
    pub const fn any() -> Self {
        Self {
            serial_number: None,
            label: None,
            channel: None,
            hub_port: None,
            is_hub_port_device: false,
            attach_timeout_ms: None,
        }
    }

    /// Address of a hub-port device (e.g. a switch wired to a hub port)
    pub const fn hub_port_device(hub_port: u8) -> Self {
        Self {
            serial_number: None,
            label: None,
            channel: None,
            hub_port: Some(hub_port),
            is_hub_port_device: true,
            attach_timeout_ms: None,
        }
    }

    /// Restrict to a device serial number
    pub fn with_serial_number(mut self, serial_number: i32) -> Self {
        self.serial_number = Some(serial_number);
        self
    }

    /// Restrict to a hub port
    pub fn with_hub_port(mut self, hub_port: u8) -> Self {
        self.hub_port = Some(hub_port);
        self
    }

    /// Restrict to a channel index
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Restrict to a device label
    ///
    /// Labels longer than [`MAX_LABEL_LEN`] are truncated.
    pub fn with_label(mut self, label: &str) -> Self {
        let mut s = String::new();
        for c in label.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        self.label = Some(s);
        self
    }

    /// Wait for attachment in `open`
    pub fn with_attach_timeout(mut self, timeout_ms: u32) -> Self {
        self.attach_timeout_ms = Some(timeout_ms);
        self
    }

    /// Replace "any" placeholders with the values the hardware reported
    ///
    /// Fields that were already concrete are overwritten too, so the address
    /// always describes the channel that actually attached.
    pub fn resolve(&mut self, device: &AttachedDevice) {
        self.serial_number = Some(device.serial_number);
        if device.label.is_some() {
            self.label = device.label.clone();
        }
        self.channel = Some(device.channel);
        self.hub_port = Some(device.hub_port);
        self.is_hub_port_device = device.is_hub_port_device;
    }

    /// Check whether an attached device satisfies this address
    pub fn matches(&self, device: &AttachedDevice) -> bool {
        self.serial_number.map_or(true, |s| s == device.serial_number)
            && self
                .label
                .as_ref()
                .map_or(true, |l| device.label.as_ref() == Some(l))
            && self.channel.map_or(true, |c| c == device.channel)
            && self.hub_port.map_or(true, |p| p == device.hub_port)
            && self.is_hub_port_device == device.is_hub_port_device
    }
}

/// Concrete identity reported by an attached channel
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttachedDevice {
    /// Device serial number
    pub serial_number: i32,
    /// Device label, if one has been written to the device
    pub label: Option<String<MAX_LABEL_LEN>>,
    /// Channel index
    pub channel: u8,
    /// Hub port
    pub hub_port: u8,
    /// Whether the device is a hub-port device
    pub is_hub_port_device: bool,
}
