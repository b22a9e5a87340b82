//! Safety interlock
//!
//! Decides when a travel-limit switch must halt the actuator.

pub mod interlock;

pub use interlock::{InterlockAction, LimitInterlock};
