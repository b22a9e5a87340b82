//! Shared channel lifecycle
//!
//! A channel attaches when it is open, the device is plugged in and the
//! configured address matches the device identity.

use std::cell::RefCell;
use std::rc::Rc;

use axial_hal::{
    AttachedDevice, Channel, ChannelAddress, ChannelError, ChannelEvent, ChannelHandle,
    EventKind, EventMask, EventPayload, EventQueue, DEFAULT_QUEUE_DEPTH,
};

/// Device-specific simulated state
pub trait SimModel {
    /// Restore power-on configuration, called on every attach
    fn reset(&mut self);
}

pub(crate) struct Shared<M> {
    pub(crate) handle: ChannelHandle,
    pub(crate) device: AttachedDevice,
    pub(crate) address: ChannelAddress,
    pub(crate) plugged: bool,
    pub(crate) open: bool,
    pub(crate) attached: bool,
    pub(crate) mask: EventMask,
    pub(crate) dropped_events: usize,
    pub(crate) model: M,
}

impl<M> Shared<M> {
    fn can_attach(&self) -> bool {
        self.open && self.plugged && self.address.matches(&self.device)
    }
}

/// Publish an event if its kind is enabled
///
/// Attach/Detach are delivered around the attached flag flip; everything
/// else only while attached.
pub(crate) fn emit<M, const N: usize>(
    shared: &mut Shared<M>,
    queue: &EventQueue<N>,
    payload: EventPayload,
) {
    let kind = payload.kind();
    let lifecycle = matches!(kind, EventKind::Attach | EventKind::Detach);
    if !shared.mask.contains(kind) || (!lifecycle && !shared.attached) {
        return;
    }
    if queue.publish(ChannelEvent::new(shared.handle, payload)).is_err() {
        shared.dropped_events += 1;
    }
}

/// Events produced by one model update, published once the update is done
pub(crate) type Outbox = Vec<EventPayload>;

pub(crate) fn apply<M, R, const N: usize>(
    shared: &mut Shared<M>,
    queue: &EventQueue<N>,
    f: impl FnOnce(&mut M, &mut Outbox) -> R,
) -> R {
    let mut outbox = Outbox::new();
    let r = f(&mut shared.model, &mut outbox);
    for payload in outbox {
        emit(shared, queue, payload);
    }
    r
}

fn attach<M: SimModel, const N: usize>(shared: &mut Shared<M>, queue: &EventQueue<N>) {
    if shared.attached || !shared.can_attach() {
        return;
    }
    shared.model.reset();
    shared.attached = true;
    emit(shared, queue, EventPayload::Attach);
}

fn detach<M, const N: usize>(shared: &mut Shared<M>, queue: &EventQueue<N>) {
    if !shared.attached {
        return;
    }
    shared.attached = false;
    emit(shared, queue, EventPayload::Detach);
}

/// A simulated channel
pub struct SimChannel<'q, M, const N: usize = DEFAULT_QUEUE_DEPTH> {
    pub(crate) shared: Rc<RefCell<Shared<M>>>,
    pub(crate) queue: &'q EventQueue<N>,
}

impl<'q, M: SimModel + Default, const N: usize> SimChannel<'q, M, N> {
    /// Create a closed channel for a plugged-in device
    pub fn new(handle: ChannelHandle, queue: &'q EventQueue<N>, device: AttachedDevice) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                handle,
                device,
                address: ChannelAddress::any(),
                plugged: true,
                open: false,
                attached: false,
                mask: EventMask::NONE,
                dropped_events: 0,
                model: M::default(),
            })),
            queue,
        }
    }
}

impl<'q, M, const N: usize> SimChannel<'q, M, N> {
    /// World-side access to this channel
    pub fn probe(&self) -> SimProbe<'q, M, N> {
        SimProbe {
            shared: Rc::clone(&self.shared),
            queue: self.queue,
        }
    }

    /// Run a command against the model, failing if detached
    pub(crate) fn command<R>(
        &self,
        f: impl FnOnce(&mut M, &mut Outbox) -> Result<R, ChannelError>,
    ) -> Result<R, ChannelError> {
        let mut shared = self.shared.borrow_mut();
        if !shared.attached {
            return Err(ChannelError::NotAttached);
        }
        apply(&mut shared, self.queue, f)
    }

    /// Run a query against the model, failing if detached
    pub(crate) fn query<R>(&self, f: impl FnOnce(&M) -> R) -> Result<R, ChannelError> {
        let shared = self.shared.borrow();
        if shared.attached {
            Ok(f(&shared.model))
        } else {
            Err(ChannelError::NotAttached)
        }
    }
}

impl<'q, M: SimModel, const N: usize> Channel for SimChannel<'q, M, N> {
    fn handle(&self) -> ChannelHandle {
        self.shared.borrow().handle
    }

    fn set_address(&mut self, address: &ChannelAddress) {
        let mut shared = self.shared.borrow_mut();
        if !shared.open {
            shared.address = address.clone();
        }
    }

    fn open(&mut self) -> Result<(), ChannelError> {
        let mut shared = self.shared.borrow_mut();
        shared.open = true;
        attach(&mut shared, self.queue);
        Ok(())
    }

    fn open_wait_for_attachment(&mut self, _timeout_ms: u32) -> Result<(), ChannelError> {
        let mut shared = self.shared.borrow_mut();
        shared.open = true;
        attach(&mut shared, self.queue);
        if shared.attached {
            Ok(())
        } else {
            // A timed-out open leaves the channel closed
            shared.open = false;
            Err(ChannelError::Timeout)
        }
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        let mut shared = self.shared.borrow_mut();
        detach(&mut shared, self.queue);
        shared.open = false;
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.shared.borrow().attached
    }

    fn attached_device(&self) -> Result<AttachedDevice, ChannelError> {
        let shared = self.shared.borrow();
        if shared.attached {
            Ok(shared.device.clone())
        } else {
            Err(ChannelError::NotAttached)
        }
    }

    fn set_event_enabled(&mut self, kind: EventKind, enabled: bool) {
        self.shared.borrow_mut().mask.set(kind, enabled);
    }
}

/// World-side handle on a simulated channel
pub struct SimProbe<'q, M, const N: usize = DEFAULT_QUEUE_DEPTH> {
    pub(crate) shared: Rc<RefCell<Shared<M>>>,
    pub(crate) queue: &'q EventQueue<N>,
}

impl<'q, M: SimModel, const N: usize> SimProbe<'q, M, N> {
    /// Plug the device in; attaches if the channel is open and matches
    pub fn plug(&self) {
        let mut shared = self.shared.borrow_mut();
        shared.plugged = true;
        attach(&mut shared, self.queue);
    }

    /// Unplug the device
    pub fn unplug(&self) {
        let mut shared = self.shared.borrow_mut();
        shared.plugged = false;
        detach(&mut shared, self.queue);
    }

    /// Report a hardware error
    pub fn raise_error(&self, code: i32, description: &str) {
        let mut shared = self.shared.borrow_mut();
        emit(&mut shared, self.queue, EventPayload::error(code, description));
    }

    pub fn is_open(&self) -> bool {
        self.shared.borrow().open
    }

    pub fn is_attached(&self) -> bool {
        self.shared.borrow().attached
    }

    /// Address the channel was opened with
    pub fn address(&self) -> ChannelAddress {
        self.shared.borrow().address.clone()
    }

    /// Check if an event kind is currently enabled
    pub fn event_enabled(&self, kind: EventKind) -> bool {
        self.shared.borrow().mask.contains(kind)
    }

    /// Check if every event kind is disabled
    pub fn events_cleared(&self) -> bool {
        self.shared.borrow().mask.is_empty()
    }

    /// Events lost to a full queue
    pub fn dropped_events(&self) -> usize {
        self.shared.borrow().dropped_events
    }

    /// Read the model
    pub fn with_model<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.shared.borrow().model)
    }

    /// Change the world, publishing whatever events the change produces
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut M, &mut Outbox) -> R) -> R {
        let mut shared = self.shared.borrow_mut();
        apply(&mut shared, self.queue, f)
    }
}
