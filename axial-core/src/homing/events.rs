//! Homing inputs and outputs

/// Inputs to the homing state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingEvent {
    /// `home()` was called
    Start {
        /// Home switch activity at the time of the call
        switch_active: bool,
    },
    /// The home switch changed state
    SwitchChanged {
        /// Polarity-corrected switch state
        active: bool,
        /// Whether the actuator was moving when the change arrived
        moving: bool,
    },
    /// The actuator came to rest
    Stopped {
        /// Home switch activity once stopped
        switch_active: bool,
    },
    /// Homing was cancelled by the caller
    Cancel,
}

/// Commands the coordinator carries out after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingAction {
    /// Nothing to do
    None,
    /// Velocity mode at the home velocity, toward the switch
    Seek,
    /// Step mode toward the clearing target; wait for the switch to release
    ClearSwitch,
    /// Arm the stopped one-shot and stop the actuator
    StopAndAwait,
    /// Zero the position at the current location and restore cruising limits
    Complete,
    /// Stop the actuator; the attempt failed
    Halt,
    /// Disarm the stopped one-shot and stop the actuator
    Abort,
}

impl HomingAction {
    /// Check if the action requires the stopped one-shot to be armed
    pub fn arms_stopped(&self) -> bool {
        matches!(self, HomingAction::ClearSwitch | HomingAction::StopAndAwait)
    }
}
