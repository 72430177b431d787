//! Operator command dispatch.
//!
//! Typed commands with the acceptance rules of the front-panel / serial
//! console: a rejected command leaves the controller untouched and comes
//! back as a [`CommandError`]. Parsing text into commands is the caller's
//! business.

use cryo_common::control_unit::state::{ControllerState, FaultReason};
use cryo_common::conversions::kelvin_to_celsius;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::state::controller::SupervisoryController;

/// Operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperatorCommand {
    /// Begin or resume cooling.
    Start,
    /// Stop cooling, or acknowledge a fault.
    Stop,
    /// De-energise everything.
    Off,
    /// Leave `Off` into the lamp test.
    PowerUp,
    /// Report current status.
    Status,
}

/// Rejection reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Already running")]
    AlreadyRunning,

    #[error("Not currently running")]
    NotRunning,

    #[error("System is already off")]
    AlreadyOff,

    /// `start` while latched in `Fault`.
    #[error("Fault latched ({0:?}); issue stop or off first")]
    FaultLatched(FaultReason),

    /// `power_up` outside `Off`.
    #[error("Power-up is only possible from Off")]
    NotOff,
}

/// Snapshot returned by `Status`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub state: ControllerState,
    pub state_name: &'static str,
    pub status_text: &'static str,
    pub fault_reason: FaultReason,
    pub running: bool,
    pub time_in_state_ms: u64,
    pub on_duration_ms: u64,
    pub backoff_event_count: u16,
    pub temperature_k: f32,
    pub temperature_c: f32,
}

/// Successful command outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CommandReply {
    /// State-changing command accepted; the resulting state.
    Accepted(ControllerState),
    Status(StatusReport),
}

/// Apply `command` to `controller` at `now_ms`.
///
/// `temperature_k` is the latest cold-stage reading, used by `Start` to pick
/// the resume state and echoed by `Status`.
pub fn dispatch(
    controller: &mut SupervisoryController,
    command: OperatorCommand,
    now_ms: u64,
    temperature_k: f32,
) -> Result<CommandReply, CommandError> {
    let result = match command {
        OperatorCommand::Start => {
            if controller.state() == ControllerState::Fault {
                Err(CommandError::FaultLatched(controller.fault_reason()))
            } else if !controller.start(now_ms, temperature_k) {
                Err(CommandError::AlreadyRunning)
            } else {
                Ok(CommandReply::Accepted(controller.state()))
            }
        }
        OperatorCommand::Stop => {
            if controller.stop(now_ms) {
                Ok(CommandReply::Accepted(controller.state()))
            } else {
                Err(CommandError::NotRunning)
            }
        }
        OperatorCommand::Off => {
            if controller.off(now_ms) {
                Ok(CommandReply::Accepted(controller.state()))
            } else {
                Err(CommandError::AlreadyOff)
            }
        }
        OperatorCommand::PowerUp => {
            if controller.power_up(now_ms) {
                Ok(CommandReply::Accepted(controller.state()))
            } else {
                Err(CommandError::NotOff)
            }
        }
        OperatorCommand::Status => Ok(CommandReply::Status(status_report(
            controller,
            now_ms,
            temperature_k,
        ))),
    };

    match &result {
        Ok(reply) => debug!(?command, ?reply, now_ms, "command accepted"),
        Err(e) => debug!(?command, error = %e, now_ms, "command rejected"),
    }
    result
}

/// Build a status snapshot without mutating the controller.
pub fn status_report(
    controller: &SupervisoryController,
    now_ms: u64,
    temperature_k: f32,
) -> StatusReport {
    StatusReport {
        state: controller.state(),
        state_name: controller.state_name(),
        status_text: controller.status_text(),
        fault_reason: controller.fault_reason(),
        running: controller.is_running(),
        time_in_state_ms: controller.time_in_state(now_ms),
        on_duration_ms: controller.on_duration(now_ms),
        backoff_event_count: controller.backoff().event_count,
        temperature_k,
        temperature_c: kelvin_to_celsius(temperature_k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::controller::TickInputs;

    #[test]
    fn start_then_start_again() {
        let mut c = SupervisoryController::default();
        assert_eq!(
            dispatch(&mut c, OperatorCommand::Start, 0, 295.0),
            Ok(CommandReply::Accepted(ControllerState::CoarseCooldown))
        );
        assert_eq!(
            dispatch(&mut c, OperatorCommand::Start, 200, 295.0),
            Err(CommandError::AlreadyRunning)
        );
    }

    #[test]
    fn stop_when_not_running() {
        let mut c = SupervisoryController::default();
        let err = dispatch(&mut c, OperatorCommand::Stop, 0, 295.0).unwrap_err();
        assert_eq!(err, CommandError::NotRunning);
        assert_eq!(err.to_string(), "Not currently running");
    }

    #[test]
    fn off_when_off() {
        let mut c = SupervisoryController::default();
        assert_eq!(
            dispatch(&mut c, OperatorCommand::Off, 0, 295.0),
            Err(CommandError::AlreadyOff)
        );
    }

    #[test]
    fn power_up_only_from_off() {
        let mut c = SupervisoryController::default();
        assert_eq!(
            dispatch(&mut c, OperatorCommand::PowerUp, 0, 295.0),
            Ok(CommandReply::Accepted(ControllerState::Initialize))
        );
        assert_eq!(
            dispatch(&mut c, OperatorCommand::PowerUp, 100, 295.0),
            Err(CommandError::NotOff)
        );
    }

    #[test]
    fn start_in_fault_is_rejected_stop_acknowledges() {
        let mut c = SupervisoryController::default();
        dispatch(&mut c, OperatorCommand::Start, 0, 150.0).unwrap();
        c.update(&TickInputs {
            temperature_k: 150.0,
            cooling_rate_k_per_min: 0.0,
            line_voltage_v: 140.0,
            stalled: false,
            overstroke: false,
            now_ms: 200,
        });
        assert_eq!(
            dispatch(&mut c, OperatorCommand::Start, 400, 150.0),
            Err(CommandError::FaultLatched(FaultReason::OverVoltage))
        );
        assert_eq!(
            dispatch(&mut c, OperatorCommand::Stop, 600, 150.0),
            Ok(CommandReply::Accepted(ControllerState::Idle))
        );
    }

    #[test]
    fn status_reports_without_side_effects() {
        let mut c = SupervisoryController::default();
        dispatch(&mut c, OperatorCommand::Start, 1_000, 82.0).unwrap();
        let reply = dispatch(&mut c, OperatorCommand::Status, 4_000, 81.5).unwrap();
        let CommandReply::Status(report) = reply else {
            panic!("expected status reply");
        };
        assert_eq!(report.state, ControllerState::FineCooldown);
        assert_eq!(report.state_name, "FineCooldown");
        assert!(report.running);
        assert_eq!(report.time_in_state_ms, 3_000);
        assert_eq!(report.on_duration_ms, 3_000);
        assert_eq!(report.temperature_k, 81.5);
        assert!((report.temperature_c - (81.5 - 273.15)).abs() < 1e-3);
        assert_eq!(c.state(), ControllerState::FineCooldown);
    }
}
