//! Per-tick controller output record.

use serde::Serialize;

use super::state::{ControllerState, IndicatorMode};

/// Everything the outer shell needs to drive hardware for one tick.
///
/// Derived from the controller state and recomputed every tick.
/// `actuator_target` is the planner target before slew limiting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Output {
    pub state: ControllerState,
    /// Planned actuator level [counts].
    pub actuator_target: u16,
    /// `true` while the bypass relay is engaged.
    pub bypass_relay: bool,
    /// `true` while the alarm relay is energised.
    pub alarm_relay: bool,
    pub fault_indicator: IndicatorMode,
    pub ready_indicator: IndicatorMode,
    pub status_text: &'static str,
    /// Overstroke events since the last start.
    pub backoff_event_count: u16,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            state: ControllerState::Off,
            actuator_target: 0,
            bypass_relay: true,
            alarm_relay: false,
            fault_indicator: IndicatorMode::Off,
            ready_indicator: IndicatorMode::Off,
            status_text: "System is off",
            backoff_event_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_unit::state::FaultReason;

    #[test]
    fn default_matches_off_state() {
        let out = Output::default();
        assert_eq!(out.state, ControllerState::Off);
        assert_eq!(
            out.status_text,
            ControllerState::Off.status_text(FaultReason::None)
        );
        assert!(out.bypass_relay);
        assert!(!out.alarm_relay);
        assert_eq!(out.actuator_target, 0);
    }
}
