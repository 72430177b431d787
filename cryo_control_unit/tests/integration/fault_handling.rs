//! Integration test: safety guard faults and fault acknowledgement.

use cryo_common::control_unit::state::{ControllerState, FaultReason, IndicatorMode};
use cryo_control_unit::command::{CommandError, CommandReply, OperatorCommand};
use cryo_control_unit::hal::simulation::SimulationParams;

use super::common::{run_until_state, runner_with, started_at};

use ControllerState::*;

#[test]
fn overvoltage_latches_fault_with_outputs_safe() {
    let mut runner = started_at(200.0);
    for _ in 0..50 {
        runner.step().unwrap();
    }
    assert_eq!(runner.controller().state(), CoarseCooldown);

    runner.driver_mut().set_line_voltage(125.0);
    let out = runner.step().unwrap();

    assert_eq!(out.state, Fault);
    assert_eq!(runner.controller().fault_reason(), FaultReason::OverVoltage);
    assert_eq!(out.status_text, "Fault: Line voltage exceeded safe limit");
    assert_eq!(out.actuator_target, 0);
    assert!(out.alarm_relay);
    assert!(out.bypass_relay);
    assert_eq!(out.fault_indicator, IndicatorMode::FlashFastRed);
    assert!(!runner.controller().is_running());

    // Latched even after the supply recovers.
    runner.driver_mut().set_line_voltage(115.0);
    for _ in 0..10 {
        assert_eq!(runner.step().unwrap().state, Fault);
    }
    assert_eq!(
        runner.command(OperatorCommand::Start),
        Err(CommandError::FaultLatched(FaultReason::OverVoltage))
    );

    // Stop acknowledges, start resumes.
    assert_eq!(
        runner.command(OperatorCommand::Stop),
        Ok(CommandReply::Accepted(Idle))
    );
    assert_eq!(runner.controller().fault_reason(), FaultReason::None);
    assert!(runner.command(OperatorCommand::Start).is_ok());
    assert!(runner.controller().state().is_cooldown());
}

#[test]
fn fault_trip_cuts_actuator_on_the_same_tick() {
    let mut runner = started_at(150.0);
    for _ in 0..600 {
        runner.step().unwrap();
    }
    assert_eq!(runner.controller().state(), CoarseCooldown);
    assert_eq!(runner.actuator_level(), 3_000);

    runner.driver_mut().set_line_voltage(130.0);
    let out = runner.step().unwrap();
    assert_eq!(out.state, Fault);
    assert_eq!(out.actuator_target, 0);
    assert_eq!(runner.actuator_level(), 0);

    // The driver sees the zero level on the next cycle.
    runner.step().unwrap();
    assert_eq!(runner.driver().last_command().level, 0);
    assert!(runner.driver().last_command().alarm_relay);
}

#[test]
fn overvoltage_detected_while_idle() {
    let mut runner = runner_with(SimulationParams {
        line_voltage_v: 130.0,
        ..SimulationParams::default()
    });
    runner.command(OperatorCommand::PowerUp).unwrap();
    let out = runner.step().unwrap();
    assert_eq!(out.state, Fault);
    assert_eq!(runner.controller().fault_reason(), FaultReason::OverVoltage);
}

#[test]
fn repeated_overstroke_ends_in_excessive_backoff() {
    let mut runner = runner_with(SimulationParams {
        spike_every_ms: Some(20_000),
        ..SimulationParams::default()
    });
    runner.command(OperatorCommand::Start).unwrap();

    let mut counts = Vec::new();
    let faulted_at = loop {
        let out = runner.step().unwrap();
        if counts.last() != Some(&out.backoff_event_count) {
            counts.push(out.backoff_event_count);
        }
        if out.state == Fault {
            break runner.now_ms();
        }
        assert!(runner.now_ms() < 400_000, "no fault by {} ms", runner.now_ms());
    };

    assert_eq!(
        runner.controller().fault_reason(),
        FaultReason::ExcessiveBackoff
    );
    assert!(
        (180_000..=240_000).contains(&faulted_at),
        "faulted at {faulted_at} ms"
    );
    assert_eq!(counts, (0..=10).collect::<Vec<u16>>());
    assert_eq!(runner.last_output().actuator_target, 0);
    assert!(runner.last_output().alarm_relay);
}

#[test]
fn backoff_lowers_target_below_plain_ramp() {
    let mut plain = started_at(290.0);
    let mut spiky = runner_with(SimulationParams {
        spike_every_ms: Some(20_000),
        ..SimulationParams::default()
    });
    spiky.command(OperatorCommand::Start).unwrap();

    for _ in 0..150 {
        plain.step().unwrap();
        spiky.step().unwrap();
    }
    // 30 s in: one overstroke event recorded.
    assert_eq!(spiky.controller().backoff().event_count, 1);
    let spiky_out = spiky.step().unwrap();
    let plain_out = plain.step().unwrap();
    assert!(spiky_out.actuator_target < plain_out.actuator_target);
}

#[test]
fn warm_stage_with_zero_target_stalls() {
    let mut runner = started_at(295.0);
    let faulted_at = run_until_state(&mut runner, Fault, 800_000);

    let Some(at) = faulted_at else {
        panic!("no stall fault");
    };
    assert!((590_000..=700_000).contains(&at), "faulted at {at} ms");
    assert_eq!(
        runner.controller().fault_reason(),
        FaultReason::TemperatureStall
    );
    assert_eq!(
        runner.last_output().status_text,
        "Fault: Temperature stalled during cooldown"
    );
}

#[test]
fn off_from_fault_then_power_up_again() {
    let mut runner = started_at(200.0);
    runner.driver_mut().set_line_voltage(140.0);
    assert_eq!(runner.step().unwrap().state, Fault);

    assert_eq!(
        runner.command(OperatorCommand::Off),
        Ok(CommandReply::Accepted(Off))
    );
    runner.driver_mut().set_line_voltage(115.0);
    let out = runner.step().unwrap();
    assert_eq!(out.state, Off);
    assert!(!out.alarm_relay);
    assert_eq!(
        runner.command(OperatorCommand::Off),
        Err(CommandError::AlreadyOff)
    );
    assert!(runner.command(OperatorCommand::PowerUp).is_ok());
    assert!(run_until_state(&mut runner, Idle, 10_000).is_some());
}
