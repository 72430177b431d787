//! Integration test: full cooldown from near-ambient to `Operating`.

use cryo_common::control_unit::state::{ControllerState, FaultReason, IndicatorMode};
use cryo_control_unit::command::{CommandReply, OperatorCommand};

use super::common::{run_until_state, runner_with, started_at};
use cryo_control_unit::hal::simulation::SimulationParams;

use ControllerState::*;

#[test]
fn cooldown_from_290k_reaches_operating() {
    let mut runner = started_at(290.0);
    assert_eq!(runner.controller().state(), CoarseCooldown);

    let mut visited = vec![CoarseCooldown];
    while runner.now_ms() < 1_500_000 {
        let out = runner.step().unwrap();
        if visited.last() != Some(&out.state) {
            visited.push(out.state);
        }
        if out.state == Operating {
            break;
        }
    }

    assert_eq!(
        visited,
        vec![CoarseCooldown, FineCooldown, Settle, Baseline, Operating]
    );
    let reached = runner.now_ms();
    assert!(
        (900_000..1_200_000).contains(&reached),
        "reached Operating at {reached} ms"
    );

    let out = runner.last_output();
    assert!(!out.bypass_relay);
    assert!(!out.alarm_relay);
    assert_eq!(out.ready_indicator, IndicatorMode::SolidGreen);
    assert_eq!(out.actuator_target, 0);
    assert_eq!(runner.controller().fault_reason(), FaultReason::None);
    assert!(runner.controller().is_running());
}

#[test]
fn operating_holds_setpoint_band() {
    let mut runner = started_at(150.0);
    let reached = run_until_state(&mut runner, Operating, 1_000_000);
    assert!(reached.is_some());

    // Five more minutes on the regulator.
    for _ in 0..1_500 {
        let out = runner.step().unwrap();
        assert_eq!(out.state, Operating);
        let t = runner.readings().temperature_k;
        assert!((76.0..=80.0).contains(&t), "temperature {t}");
    }
}

#[test]
fn actuator_level_is_slew_limited_and_bounded() {
    let mut runner = started_at(290.0);
    let mut previous = runner.actuator_level();
    for _ in 0..3_000 {
        runner.step().unwrap();
        let level = runner.actuator_level();
        assert!(level.abs_diff(previous) <= 5);
        assert!(level <= 4095);
        previous = level;
    }
    assert!(previous > 0);
}

#[test]
fn temperature_falls_during_coarse_cooldown() {
    let mut runner = started_at(290.0);
    for _ in 0..1_500 {
        runner.step().unwrap();
    }
    assert_eq!(runner.controller().state(), CoarseCooldown);
    assert!(runner.readings().temperature_k < 290.0);
    assert!(runner.history().cooling_rate_k_per_min() > 0.0);
}

#[test]
fn power_up_lamp_test_then_idle() {
    let mut runner = runner_with(SimulationParams::default());
    assert_eq!(
        runner.command(OperatorCommand::PowerUp),
        Ok(CommandReply::Accepted(Initialize))
    );

    let out = runner.step().unwrap();
    assert_eq!(out.state, Initialize);
    assert_eq!(out.fault_indicator, IndicatorMode::SolidAmber);

    let idle_at = run_until_state(&mut runner, Idle, 10_000);
    assert_eq!(idle_at, Some(1_600));
    assert_eq!(runner.last_output().fault_indicator, IndicatorMode::SolidRed);
    assert!(!runner.controller().is_running());
}
