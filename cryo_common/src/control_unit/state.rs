//! State enums for the supervisory controller.
//!
//! `ControllerState` carries a signed numeric code (`Off = -1`) so telemetry
//! consumers can log the state as a single integer. `FaultReason` and
//! `IndicatorMode` use `#[repr(u8)]`.

use serde::{Deserialize, Serialize};

// ─── Controller State ───────────────────────────────────────────────

/// Supervisory controller lifecycle state.
///
/// Exactly one state is current. `Fault` is terminal until the operator
/// issues `stop` or `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum ControllerState {
    /// Outputs de-energised; waiting for power-up or start.
    Off = -1,
    /// Amber lamp-test period after power-up.
    Initialize = 0,
    /// Powered, not cooling.
    Idle = 1,
    /// Cooling, cold stage above the coarse/fine threshold.
    CoarseCooldown = 2,
    /// Cooling, cold stage between the threshold and the setpoint band.
    FineCooldown = 3,
    /// Cold stage below the setpoint band.
    Overshoot = 4,
    /// In band, dwell timer running.
    Settle = 5,
    /// Settled, collecting baseline data.
    Baseline = 6,
    /// Normal operation.
    Operating = 7,
    /// Latched safety fault.
    Fault = 8,
}

impl ControllerState {
    /// All states in code order.
    pub const ALL: [Self; 10] = [
        Self::Off,
        Self::Initialize,
        Self::Idle,
        Self::CoarseCooldown,
        Self::FineCooldown,
        Self::Overshoot,
        Self::Settle,
        Self::Baseline,
        Self::Operating,
        Self::Fault,
    ];

    /// Convert from the telemetry code. Returns `None` for unknown codes.
    #[inline]
    pub const fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::Off),
            0 => Some(Self::Initialize),
            1 => Some(Self::Idle),
            2 => Some(Self::CoarseCooldown),
            3 => Some(Self::FineCooldown),
            4 => Some(Self::Overshoot),
            5 => Some(Self::Settle),
            6 => Some(Self::Baseline),
            7 => Some(Self::Operating),
            8 => Some(Self::Fault),
            _ => None,
        }
    }

    /// Telemetry code.
    #[inline]
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Short machine-readable label, as carried in telemetry frames.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Initialize => "Initialize",
            Self::Idle => "Idle",
            Self::CoarseCooldown => "CoarseCooldown",
            Self::FineCooldown => "FineCooldown",
            Self::Overshoot => "Overshoot",
            Self::Settle => "Settle",
            Self::Baseline => "Baseline",
            Self::Operating => "Operating",
            Self::Fault => "Fault",
        }
    }

    /// Human-readable status line. `Fault` delegates to the fault reason.
    pub const fn status_text(self, fault: FaultReason) -> &'static str {
        match self {
            Self::Off => "System is off",
            Self::Initialize => "Initial power up state",
            Self::Idle => "Cold stage is warm; dewar is not cooling",
            Self::CoarseCooldown => "Cooling; cold stage is above the coarse/fine threshold",
            Self::FineCooldown => "Cooling; cold stage is below the coarse/fine threshold",
            Self::Overshoot => "Cold stage is cooler than set point; integrator is settling",
            Self::Settle => "Cold stage temperature is settling; circuits switched to Normal",
            Self::Baseline => "Cold stage temperature has settled; collecting baseline data",
            Self::Operating => {
                "System is operating normally; checking for deviations from baseline"
            }
            Self::Fault => fault.status_text(),
        }
    }

    /// States in which the cooldown ramp drives the actuator.
    #[inline]
    pub const fn is_cooldown(self) -> bool {
        matches!(self, Self::CoarseCooldown | Self::FineCooldown)
    }

    /// States in which the bypass relay is released (circuits on Normal).
    #[inline]
    pub const fn is_normal_circuit(self) -> bool {
        matches!(self, Self::Settle | Self::Baseline | Self::Operating)
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::Off
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Fault Reason ───────────────────────────────────────────────────

/// Why the controller entered `Fault`. `None` outside `Fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FaultReason {
    None = 0,
    /// Line voltage above the safety ceiling.
    OverVoltage = 1,
    /// Cold stage stopped cooling during cooldown.
    TemperatureStall = 2,
    /// Overstroke backoff ceiling reached.
    ExcessiveBackoff = 3,
}

impl FaultReason {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::OverVoltage),
            2 => Some(Self::TemperatureStall),
            3 => Some(Self::ExcessiveBackoff),
            _ => None,
        }
    }

    /// Status line shown while latched in `Fault`.
    pub const fn status_text(self) -> &'static str {
        match self {
            Self::None => "Fault: Unknown",
            Self::OverVoltage => "Fault: Line voltage exceeded safe limit",
            Self::TemperatureStall => "Fault: Temperature stalled during cooldown",
            Self::ExcessiveBackoff => "Fault: Too many overstroke events; output backed off",
        }
    }
}

impl Default for FaultReason {
    fn default() -> Self {
        Self::None
    }
}

// ─── Indicators ─────────────────────────────────────────────────────

/// Front-panel indicator drive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum IndicatorMode {
    Off = 0,
    SolidRed = 1,
    SolidGreen = 2,
    SolidAmber = 3,
    FlashFastRed = 4,
    FlashSlowRed = 5,
    FlashFastGreen = 6,
    FlashSlowGreen = 7,
}

impl IndicatorMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::SolidRed),
            2 => Some(Self::SolidGreen),
            3 => Some(Self::SolidAmber),
            4 => Some(Self::FlashFastRed),
            5 => Some(Self::FlashSlowRed),
            6 => Some(Self::FlashFastGreen),
            7 => Some(Self::FlashSlowGreen),
            _ => None,
        }
    }

    /// Whether the indicator blinks.
    #[inline]
    pub const fn is_flashing(self) -> bool {
        matches!(
            self,
            Self::FlashFastRed | Self::FlashSlowRed | Self::FlashFastGreen | Self::FlashSlowGreen
        )
    }
}

impl Default for IndicatorMode {
    fn default() -> Self {
        Self::Off
    }
}
