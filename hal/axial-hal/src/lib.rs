//! Axial Hardware Abstraction Layer
//!
//! This crate defines the interface between the joint logic and the vendor
//! hardware-access library. A binding for a concrete library implements these
//! traits; `axial-hal-sim` implements them in memory for host testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  axial-drivers (switches, stepper,      │
//! │  composite, joint coordinator)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  axial-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ vendor library│       │ axial-hal-sim │
//! │    binding    │       │  (in memory)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Events
//!
//! Hardware callbacks may fire on threads owned by the vendor library. They
//! are published as [`ChannelEvent`]s into an [`EventQueue`] and drained on a
//! single dispatch context, so handlers never run concurrently or reentrantly.
//!
//! # Traits
//!
//! - [`channel::Channel`] - Open/close/attach lifecycle shared by all channels
//! - [`digital::DigitalInputChannel`], [`digital::DigitalOutputChannel`] - Digital I/O
//! - [`stepper::StepperChannel`] - Stepper motion channel
//! - [`voltage_ratio::VoltageRatioInputChannel`] - Bridge input (load cells)

#![no_std]
#![deny(unsafe_code)]

pub mod address;
pub mod channel;
pub mod digital;
pub mod event;
pub mod stepper;
pub mod text;
pub mod voltage_ratio;

// Re-export key types at crate root for convenience
pub use address::{AttachedDevice, ChannelAddress, ChannelHandle, MAX_LABEL_LEN};
pub use channel::{Channel, ChannelError};
pub use digital::{DigitalInputChannel, DigitalOutputChannel};
pub use event::{
    ChannelEvent, EventKind, EventMask, EventPayload, EventQueue, DEFAULT_QUEUE_DEPTH,
    MAX_ERROR_LEN,
};
pub use stepper::{Bounds, ControlMode, StepperChannel};
pub use text::push_truncated;
pub use voltage_ratio::{BridgeGain, VoltageRatioInputChannel};
