//! Channel events and the dispatch queue
//!
//! The hardware-access library delivers callbacks on its own threads. Channel
//! implementations publish those callbacks into an [`EventQueue`]; the
//! application drains the queue from a single context and hands each event to
//! the component that owns the channel. Handlers therefore never run
//! concurrently with each other or with commands.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::String;

use crate::address::ChannelHandle;
use crate::text::push_truncated;

/// Maximum length of an error description
pub const MAX_ERROR_LEN: usize = 64;

/// Default number of events buffered between drains
pub const DEFAULT_QUEUE_DEPTH: usize = 32;

/// Kinds of events a channel can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    Attach,
    Detach,
    Error,
    StateChange,
    PositionChange,
    VelocityChange,
    Stopped,
    VoltageRatioChange,
    SensorChange,
}

impl EventKind {
    /// Every event kind
    pub const ALL: [EventKind; 9] = [
        EventKind::Attach,
        EventKind::Detach,
        EventKind::Error,
        EventKind::StateChange,
        EventKind::PositionChange,
        EventKind::VelocityChange,
        EventKind::Stopped,
        EventKind::VoltageRatioChange,
        EventKind::SensorChange,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of enabled event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventMask(u16);

impl EventMask {
    /// No events enabled
    pub const NONE: EventMask = EventMask(0);

    /// Enable or disable one kind
    pub fn set(&mut self, kind: EventKind, enabled: bool) {
        if enabled {
            self.0 |= kind.bit();
        } else {
            self.0 &= !kind.bit();
        }
    }

    /// Check if a kind is enabled
    pub fn contains(&self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Check if nothing is enabled
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Event data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventPayload {
    Attach,
    Detach,
    Error {
        code: i32,
        description: String<MAX_ERROR_LEN>,
    },
    /// Raw digital state
    StateChange(bool),
    /// Raw (hardware-signed) position
    PositionChange(f64),
    /// Raw (hardware-signed) velocity
    VelocityChange(f64),
    Stopped,
    /// Bridge output over excitation
    VoltageRatioChange(f64),
    /// Voltage ratio converted by the sensor type
    SensorChange(f64),
}

impl EventPayload {
    /// Kind of this payload
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Attach => EventKind::Attach,
            EventPayload::Detach => EventKind::Detach,
            EventPayload::Error { .. } => EventKind::Error,
            EventPayload::StateChange(_) => EventKind::StateChange,
            EventPayload::PositionChange(_) => EventKind::PositionChange,
            EventPayload::VelocityChange(_) => EventKind::VelocityChange,
            EventPayload::Stopped => EventKind::Stopped,
            EventPayload::VoltageRatioChange(_) => EventKind::VoltageRatioChange,
            EventPayload::SensorChange(_) => EventKind::SensorChange,
        }
    }

    /// Build an error payload, truncating long descriptions
    pub fn error(code: i32, description: &str) -> Self {
        let mut text = String::new();
        push_truncated(&mut text, description);
        EventPayload::Error {
            code,
            description: text,
        }
    }
}

/// An event raised by one channel
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelEvent {
    /// Channel that raised the event
    pub handle: ChannelHandle,
    /// Event data
    pub payload: EventPayload,
}

impl ChannelEvent {
    pub fn new(handle: ChannelHandle, payload: EventPayload) -> Self {
        Self { handle, payload }
    }
}

/// Bounded multi-producer queue of channel events
///
/// Producers may run on any thread; draining happens on one context.
pub struct EventQueue<const N: usize = DEFAULT_QUEUE_DEPTH> {
    inner: Channel<CriticalSectionRawMutex, ChannelEvent, N>,
}

impl<const N: usize> EventQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    /// Enqueue an event
    ///
    /// Returns the event back if the queue is full.
    pub fn publish(&self, event: ChannelEvent) -> Result<(), ChannelEvent> {
        self.inner.try_send(event).map_err(|e| match e {
            TrySendError::Full(event) => event,
        })
    }

    /// Dequeue the oldest event, if any
    pub fn next(&self) -> Option<ChannelEvent> {
        self.inner.try_receive().ok()
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Discard every buffered event
    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(handle: u32, payload: EventPayload) -> ChannelEvent {
        ChannelEvent::new(ChannelHandle(handle), payload)
    }

    #[test]
    fn test_queue_fifo() {
        let queue: EventQueue<4> = EventQueue::new();
        queue.publish(ev(1, EventPayload::Attach)).unwrap();
        queue.publish(ev(2, EventPayload::StateChange(true))).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next(), Some(ev(1, EventPayload::Attach)));
        assert_eq!(queue.next(), Some(ev(2, EventPayload::StateChange(true))));
        assert_eq!(queue.next(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_full_returns_event() {
        let queue: EventQueue<1> = EventQueue::new();
        queue.publish(ev(1, EventPayload::Attach)).unwrap();

        let rejected = queue.publish(ev(1, EventPayload::Stopped));
        assert_eq!(rejected, Err(ev(1, EventPayload::Stopped)));
    }

    #[test]
    fn test_queue_clear() {
        let queue: EventQueue<4> = EventQueue::new();
        queue.publish(ev(1, EventPayload::Attach)).unwrap();
        queue.publish(ev(1, EventPayload::Detach)).unwrap();
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_mask() {
        let mut mask = EventMask::default();
        assert!(mask.is_empty());

        mask.set(EventKind::Stopped, true);
        mask.set(EventKind::Attach, true);
        assert!(mask.contains(EventKind::Stopped));
        assert!(!mask.contains(EventKind::Detach));

        mask.set(EventKind::Stopped, false);
        assert!(!mask.contains(EventKind::Stopped));
        assert!(mask.contains(EventKind::Attach));

        // Every kind has its own bit
        let mut all = EventMask::NONE;
        for kind in EventKind::ALL {
            assert!(!all.contains(kind));
            all.set(kind, true);
        }
        for kind in EventKind::ALL {
            all.set(kind, false);
        }
        assert!(all.is_empty());
    }

    #[test]
    fn test_payload_kind() {
        assert_eq!(EventPayload::PositionChange(1.0).kind(), EventKind::PositionChange);
        assert_eq!(EventPayload::error(3, "bad").kind(), EventKind::Error);
        assert_eq!(
            EventPayload::VoltageRatioChange(0.5).kind(),
            EventKind::VoltageRatioChange
        );
    }

    #[test]
    fn test_error_description_truncated() {
        let bytes = [b'x'; 200];
        let long = core::str::from_utf8(&bytes).unwrap();
        match EventPayload::error(1, long) {
            EventPayload::Error { description, .. } => {
                assert_eq!(description.len(), MAX_ERROR_LEN)
            }
            _ => panic!("expected error payload"),
        }
    }
}
