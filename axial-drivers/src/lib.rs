//! Stepper joint components
//!
//! Components built over the Axial HAL channel traits:
//!
//! - [`PolaritySwitch`]: digital input with active-low/active-high correction
//! - [`PolarityOutput`] and [`OutputBank`]: digital outputs, e.g. an LED hub
//! - [`VoltageRatioInput`]: bridge input (load cell) with its config
//!   re-applied on every attach
//! - [`DirectionStepper`]: stepper with direction correction and config
//!   re-applied on every attach
//! - [`Composite`]: attach dispatch and readiness over borrowed members
//! - [`StepperJoint`]: homing and limit-switch safety for one axis
//!
//! Hardware callbacks publish into an [`EventQueue`](axial_hal::EventQueue).
//! The application drains it on one context and hands each event to the
//! owning joint or bank:
//!
//! ```ignore
//! let mut joint = StepperJoint::new(config, stepper, home, Some(limit))?;
//! joint.open()?;
//! loop {
//!     while let Some(event) = queue.next() {
//!         joint.handle_event(&event);
//!     }
//!     // ...
//! }
//! ```

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

// Declared first so the logging macros are visible below
#[macro_use]
mod fmt;

pub mod component;
pub mod composite;
pub mod error;
pub mod joint;
pub mod output;
pub mod stepper;
pub mod switch;
pub mod voltage_ratio;

pub use component::{ChannelPort, Name, Subscriber};
pub use composite::{Composite, Member, MAX_MEMBERS};
pub use error::{CompositeError, JointError, MemberFailure};
pub use joint::{
    HomedHandler, JointState, JointStateHandler, LimitPolicy, LimitSwitchHandler, StepperJoint,
};
pub use output::{led_hub_config, OutputBank, PolarityOutput, LED_HUB_LABEL, LED_HUB_OUTPUTS};
pub use stepper::{DirectionStepper, StepperNotice, StoppedHandler, ValueHandler};
pub use switch::{PolaritySwitch, StateChangeHandler, SwitchState};
pub use voltage_ratio::VoltageRatioInput;
