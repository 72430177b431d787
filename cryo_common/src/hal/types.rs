//! Records exchanged with a cryostat driver once per tick.

use crate::control_unit::output::Output;
use crate::control_unit::state::IndicatorMode;

/// Command handed to the driver: slew-limited actuator level plus relays
/// and indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorCommand {
    /// Actual actuator level after slew limiting [counts].
    pub level: u16,
    pub bypass_relay: bool,
    pub alarm_relay: bool,
    pub fault_indicator: IndicatorMode,
    pub ready_indicator: IndicatorMode,
}

impl Default for ActuatorCommand {
    /// Actuator at zero with the bypass relay engaged.
    fn default() -> Self {
        Self {
            level: 0,
            bypass_relay: true,
            alarm_relay: false,
            fault_indicator: IndicatorMode::Off,
            ready_indicator: IndicatorMode::Off,
        }
    }
}

impl ActuatorCommand {
    /// Combine a controller output with the slew-limited level.
    pub fn from_output(output: &Output, level: u16) -> Self {
        Self {
            level,
            bypass_relay: output.bypass_relay,
            alarm_relay: output.alarm_relay,
            fault_indicator: output.fault_indicator,
            ready_indicator: output.ready_indicator,
        }
    }
}

/// Sensor values acquired by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReadings {
    /// Cold-stage temperature [K].
    pub temperature_k: f32,
    /// Compressor drive current [A].
    pub current_a: f32,
    /// Line voltage [V].
    pub line_voltage_v: f32,
}
