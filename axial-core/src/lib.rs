//! Hardware-agnostic logic for stepper joints
//!
//! This crate contains the parts of a joint that do not touch a channel:
//!
//! - Configuration types and their TOML / binary codecs
//! - Direction transform between logical and hardware sign conventions
//! - Homing state machine
//! - Limit-switch interlock policy

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod homing;
pub mod motion;
pub mod safety;
