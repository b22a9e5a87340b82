//! Homing state definition
//!
//! Joint runtime state is a function of the current state and an event. The
//! table is finite: starting on an active switch is a phase, not a retry
//! loop, so a flickering switch cannot recurse.

use super::events::{HomingAction, HomingEvent};

/// Phases within an active homing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingPhase {
    /// Started on an active switch; moving off it
    ClearingSwitch,
    /// Travelling toward the switch in velocity mode
    Seeking,
    /// Switch reached while moving; waiting for the actuator to stop
    Stopping,
    /// The clearing move ended with the switch still active
    ClearFailed,
}

/// Joint homing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingState {
    /// Never homed, or homing cancelled
    #[default]
    Idle,
    /// Homing in progress
    Homing(HomingPhase),
    /// Logical zero established
    Homed,
}

impl HomingState {
    /// Check if the joint has been homed
    pub fn is_homed(&self) -> bool {
        matches!(self, HomingState::Homed)
    }

    /// Check if a homing attempt is in progress
    ///
    /// A failed clearing move still counts: the attempt stays open until it
    /// is restarted or cancelled.
    pub fn is_homing(&self) -> bool {
        matches!(self, HomingState::Homing(_))
    }

    /// Current phase, if homing
    pub fn phase(&self) -> Option<HomingPhase> {
        match self {
            HomingState::Homing(phase) => Some(*phase),
            _ => None,
        }
    }

    /// Process an event and return the next state with its action
    pub fn transition(self, event: HomingEvent) -> (Self, HomingAction) {
        use HomingAction as A;
        use HomingEvent::*;
        use HomingPhase::*;
        use HomingState::*;

        match (self, event) {
            // Starting is legal from anywhere, including mid-attempt
            (_, Start { switch_active: false }) => (Homing(Seeking), A::Seek),
            (_, Start { switch_active: true }) => (Homing(ClearingSwitch), A::ClearSwitch),

            // Clearing: re-enter the seek as soon as the switch releases
            (Homing(ClearingSwitch), SwitchChanged { active: false, .. }) => {
                (Homing(Seeking), A::Seek)
            }
            (Homing(ClearingSwitch), Stopped { switch_active: false }) => {
                (Homing(Seeking), A::Seek)
            }
            (Homing(ClearingSwitch), Stopped { switch_active: true }) => {
                (Homing(ClearFailed), A::Halt)
            }

            // Seeking: switch reached
            (Homing(Seeking), SwitchChanged { active: true, moving: true }) => {
                (Homing(Stopping), A::StopAndAwait)
            }
            (Homing(Seeking), SwitchChanged { active: true, moving: false }) => {
                (Homed, A::Complete)
            }

            // Stopping: motion has ceased
            (Homing(Stopping), Stopped { .. }) => (Homed, A::Complete),

            (Homing(_), Cancel) => (Idle, A::Abort),

            // Default: stay in current state
            _ => (self, A::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_start_inactive_seeks() {
        for state in [HomingState::Idle, HomingState::Homed] {
            let (next, action) = state.transition(HomingEvent::Start {
                switch_active: false,
            });
            assert_eq!(next, HomingState::Homing(HomingPhase::Seeking));
            assert_eq!(action, HomingAction::Seek);
        }
    }

    #[test]
    fn test_start_active_clears_first() {
        let (next, action) = HomingState::Idle.transition(HomingEvent::Start {
            switch_active: true,
        });
        assert_eq!(next, HomingState::Homing(HomingPhase::ClearingSwitch));
        assert_eq!(action, HomingAction::ClearSwitch);
        assert!(action.arms_stopped());
    }

    #[test]
    fn test_seek_flow() {
        let state = HomingState::Homing(HomingPhase::Seeking);

        // Switch still inactive: nothing happens
        let (state, action) = state.transition(HomingEvent::SwitchChanged {
            active: false,
            moving: true,
        });
        assert_eq!(state, HomingState::Homing(HomingPhase::Seeking));
        assert_eq!(action, HomingAction::None);

        // Switch reached while moving
        let (state, action) = state.transition(HomingEvent::SwitchChanged {
            active: true,
            moving: true,
        });
        assert_eq!(state, HomingState::Homing(HomingPhase::Stopping));
        assert_eq!(action, HomingAction::StopAndAwait);

        // Motion stops
        let (state, action) = state.transition(HomingEvent::Stopped {
            switch_active: true,
        });
        assert_eq!(state, HomingState::Homed);
        assert_eq!(action, HomingAction::Complete);
        assert!(state.is_homed());
        assert!(!state.is_homing());
    }

    #[test]
    fn test_switch_reached_while_stationary_completes() {
        let (state, action) =
            HomingState::Homing(HomingPhase::Seeking).transition(HomingEvent::SwitchChanged {
                active: true,
                moving: false,
            });
        assert_eq!(state, HomingState::Homed);
        assert_eq!(action, HomingAction::Complete);
    }

    #[test]
    fn test_clearing_flow() {
        let clearing = HomingState::Homing(HomingPhase::ClearingSwitch);

        // Release before the clearing move finishes
        let (state, action) = clearing.transition(HomingEvent::SwitchChanged {
            active: false,
            moving: true,
        });
        assert_eq!(state, HomingState::Homing(HomingPhase::Seeking));
        assert_eq!(action, HomingAction::Seek);

        // Clearing move finished, switch already released
        let (state, action) = clearing.transition(HomingEvent::Stopped {
            switch_active: false,
        });
        assert_eq!(state, HomingState::Homing(HomingPhase::Seeking));
        assert_eq!(action, HomingAction::Seek);

        // Clearing move finished, switch still active
        let (state, action) = clearing.transition(HomingEvent::Stopped {
            switch_active: true,
        });
        assert_eq!(state, HomingState::Homing(HomingPhase::ClearFailed));
        assert_eq!(action, HomingAction::Halt);
        assert!(state.is_homing());
    }

    #[test]
    fn test_clear_failed_is_sticky() {
        let failed = HomingState::Homing(HomingPhase::ClearFailed);
        let events = [
            HomingEvent::SwitchChanged {
                active: false,
                moving: false,
            },
            HomingEvent::SwitchChanged {
                active: true,
                moving: false,
            },
            HomingEvent::Stopped {
                switch_active: false,
            },
        ];
        for event in events {
            assert_eq!(failed.transition(event), (failed, HomingAction::None));
        }
    }

    #[test]
    fn test_cancel() {
        for phase in [
            HomingPhase::ClearingSwitch,
            HomingPhase::Seeking,
            HomingPhase::Stopping,
            HomingPhase::ClearFailed,
        ] {
            let (state, action) = HomingState::Homing(phase).transition(HomingEvent::Cancel);
            assert_eq!(state, HomingState::Idle);
            assert_eq!(action, HomingAction::Abort);
        }

        // Cancel outside homing is ignored
        assert_eq!(
            HomingState::Homed.transition(HomingEvent::Cancel),
            (HomingState::Homed, HomingAction::None)
        );
    }

    #[test]
    fn test_stray_stop_ignored_while_seeking() {
        let seeking = HomingState::Homing(HomingPhase::Seeking);
        assert_eq!(
            seeking.transition(HomingEvent::Stopped {
                switch_active: true
            }),
            (seeking, HomingAction::None)
        );
    }

    fn any_state() -> impl Strategy<Value = HomingState> {
        prop_oneof![
            Just(HomingState::Idle),
            Just(HomingState::Homed),
            Just(HomingState::Homing(HomingPhase::ClearingSwitch)),
            Just(HomingState::Homing(HomingPhase::Seeking)),
            Just(HomingState::Homing(HomingPhase::Stopping)),
            Just(HomingState::Homing(HomingPhase::ClearFailed)),
        ]
    }

    fn any_event() -> impl Strategy<Value = HomingEvent> {
        prop_oneof![
            any::<bool>().prop_map(|switch_active| HomingEvent::Start { switch_active }),
            (any::<bool>(), any::<bool>())
                .prop_map(|(active, moving)| HomingEvent::SwitchChanged { active, moving }),
            any::<bool>().prop_map(|switch_active| HomingEvent::Stopped { switch_active }),
            Just(HomingEvent::Cancel),
        ]
    }

    proptest! {
        #[test]
        fn prop_homed_excludes_homing(
            start in any_state(),
            events in proptest::collection::vec(any_event(), 0..32),
        ) {
            let mut state = start;
            for event in events {
                state = state.transition(event).0;
                prop_assert!(!(state.is_homed() && state.is_homing()));
            }
        }

        #[test]
        fn prop_complete_always_lands_homed(
            start in any_state(),
            event in any_event(),
        ) {
            let (next, action) = start.transition(event);
            if action == HomingAction::Complete {
                prop_assert_eq!(next, HomingState::Homed);
            }
        }
    }
}
