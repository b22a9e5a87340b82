//! Limit-switch interlock
//!
//! Independent of homing: whenever the interlock is armed and the limit
//! switch becomes active, the actuator is stopped, once per transition.

use crate::config::LimitSwitchMode;

/// Interlock decision for one switch update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterlockAction {
    /// Leave the actuator alone
    None,
    /// Stop the actuator
    Stop,
}

/// Tracks the limit switch and the configured policy
#[derive(Debug, Clone)]
pub struct LimitInterlock {
    mode: LimitSwitchMode,
    /// Last polarity-corrected state seen, if any
    last_active: Option<bool>,
}

impl LimitInterlock {
    pub fn new(mode: LimitSwitchMode) -> Self {
        Self {
            mode,
            last_active: None,
        }
    }

    pub fn mode(&self) -> LimitSwitchMode {
        self.mode
    }

    /// Replace the policy
    ///
    /// Switch changes go unseen while the policy is disarmed, so the last
    /// seen state is forgotten.
    pub fn set_mode(&mut self, mode: LimitSwitchMode) {
        self.mode = mode;
        self.last_active = None;
    }

    /// Process a limit switch state report
    ///
    /// Repeated reports of the same state do not re-trigger.
    pub fn update(&mut self, active: bool) -> InterlockAction {
        let rising = active && self.last_active != Some(true);
        self.last_active = Some(active);

        match self.mode {
            LimitSwitchMode::StopOnActive if rising => InterlockAction::Stop,
            _ => InterlockAction::None,
        }
    }

    /// Forget the last seen state (switch detached)
    pub fn reset(&mut self) {
        self.last_active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_once_per_activation() {
        let mut interlock = LimitInterlock::new(LimitSwitchMode::StopOnActive);

        assert_eq!(interlock.update(false), InterlockAction::None);
        assert_eq!(interlock.update(true), InterlockAction::Stop);
        // Duplicate report of the same state
        assert_eq!(interlock.update(true), InterlockAction::None);
        assert_eq!(interlock.update(false), InterlockAction::None);
        assert_eq!(interlock.update(true), InterlockAction::Stop);
    }

    #[test]
    fn test_disabled_never_stops() {
        let mut interlock = LimitInterlock::new(LimitSwitchMode::Disabled);
        for active in [true, false, true, true] {
            assert_eq!(interlock.update(active), InterlockAction::None);
        }
    }

    #[test]
    fn test_mode_switch_replaces_policy() {
        let mut interlock = LimitInterlock::new(LimitSwitchMode::Disabled);
        assert_eq!(interlock.update(true), InterlockAction::None);
        interlock.update(false);

        interlock.set_mode(LimitSwitchMode::StopOnActive);
        assert_eq!(interlock.update(true), InterlockAction::Stop);
    }

    #[test]
    fn test_mode_switch_forgets_stale_state() {
        let mut interlock = LimitInterlock::new(LimitSwitchMode::StopOnActive);
        assert_eq!(interlock.update(true), InterlockAction::Stop);

        // Release happens while disabled and is never reported
        interlock.set_mode(LimitSwitchMode::Disabled);
        interlock.set_mode(LimitSwitchMode::StopOnActive);
        assert_eq!(interlock.update(true), InterlockAction::Stop);
    }

    #[test]
    fn test_reset_rearms() {
        let mut interlock = LimitInterlock::new(LimitSwitchMode::StopOnActive);
        assert_eq!(interlock.update(true), InterlockAction::Stop);
        interlock.reset();
        assert_eq!(interlock.update(true), InterlockAction::Stop);
    }
}
