//! Per-state relay and indicator table.

use cryo_common::control_unit::state::{ControllerState, IndicatorMode};

/// Relay and indicator drive for one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelDrive {
    pub bypass_relay: bool,
    pub alarm_relay: bool,
    pub fault_indicator: IndicatorMode,
    pub ready_indicator: IndicatorMode,
}

/// Front-panel drive for `state`.
pub const fn panel_drive(state: ControllerState) -> PanelDrive {
    use ControllerState::*;
    use IndicatorMode as Lamp;

    let (fault_indicator, ready_indicator) = match state {
        Off => (Lamp::Off, Lamp::Off),
        Initialize => (Lamp::SolidAmber, Lamp::SolidAmber),
        Idle => (Lamp::SolidRed, Lamp::Off),
        CoarseCooldown => (Lamp::FlashFastRed, Lamp::Off),
        FineCooldown => (Lamp::FlashFastRed, Lamp::FlashSlowGreen),
        Overshoot | Settle => (Lamp::FlashFastRed, Lamp::FlashFastGreen),
        Baseline | Operating => (Lamp::Off, Lamp::SolidGreen),
        Fault => (Lamp::FlashFastRed, Lamp::Off),
    };

    PanelDrive {
        bypass_relay: !state.is_normal_circuit(),
        alarm_relay: matches!(state, Fault),
        fault_indicator,
        ready_indicator,
    }
}
