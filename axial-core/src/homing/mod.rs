//! Homing state machine
//!
//! Homing establishes logical zero at the point where the home switch becomes
//! active. The machine is a pure transition table; the joint coordinator
//! feeds it switch and motion events and carries out the returned actions.

pub mod events;
pub mod machine;

pub use events::{HomingAction, HomingEvent};
pub use machine::{HomingPhase, HomingState};
