//! Integration test: stop / restart picks the resume state from the
//! current cold-stage temperature.

use cryo_common::control_unit::state::ControllerState;
use cryo_control_unit::command::{CommandError, CommandReply, OperatorCommand, StatusReport};

use super::common::{run_until_state, run_until_temp, started_at};

use ControllerState::*;

fn status(reply: CommandReply) -> StatusReport {
    match reply {
        CommandReply::Status(report) => report,
        other => panic!("expected status, got {other:?}"),
    }
}

#[test]
fn restart_in_band_resumes_at_settle() {
    let mut runner = started_at(82.0);
    assert_eq!(runner.controller().state(), FineCooldown);
    assert!(run_until_state(&mut runner, Settle, 300_000).is_some());

    assert_eq!(
        runner.command(OperatorCommand::Stop),
        Ok(CommandReply::Accepted(Idle))
    );
    let out = runner.step().unwrap();
    assert_eq!(out.state, Idle);
    assert_eq!(out.actuator_target, 0);

    assert_eq!(
        runner.command(OperatorCommand::Start),
        Ok(CommandReply::Accepted(Settle))
    );
    assert_eq!(runner.controller().settle_elapsed(runner.now_ms()), 0);
}

#[test]
fn restart_after_warming_resumes_coarse() {
    let mut runner = started_at(150.0);
    assert!(run_until_state(&mut runner, Operating, 1_000_000).is_some());

    runner.command(OperatorCommand::Stop).unwrap();
    let stopped_at = runner.now_ms();
    assert!(run_until_temp(&mut runner, stopped_at + 600_000, |t| t > 86.0));
    assert_eq!(runner.controller().state(), Idle);

    assert_eq!(
        runner.command(OperatorCommand::Start),
        Ok(CommandReply::Accepted(CoarseCooldown))
    );
}

#[test]
fn restart_between_threshold_and_band_resumes_fine() {
    let mut runner = started_at(150.0);
    assert!(run_until_state(&mut runner, Operating, 1_000_000).is_some());

    runner.command(OperatorCommand::Stop).unwrap();
    let stopped_at = runner.now_ms();
    assert!(run_until_temp(&mut runner, stopped_at + 600_000, |t| t > 81.0));

    assert_eq!(
        runner.command(OperatorCommand::Start),
        Ok(CommandReply::Accepted(FineCooldown))
    );
}

#[test]
fn on_duration_freezes_when_stopped() {
    let mut runner = started_at(200.0);
    for _ in 0..100 {
        runner.step().unwrap();
    }
    let on_before = status(runner.command(OperatorCommand::Status).unwrap()).on_duration_ms;
    assert_eq!(on_before, 20_000);

    runner.command(OperatorCommand::Stop).unwrap();
    for _ in 0..100 {
        runner.step().unwrap();
    }
    let report = status(runner.command(OperatorCommand::Status).unwrap());
    assert_eq!(report.on_duration_ms, 20_000);
    assert_eq!(report.state, Idle);
    assert!(!report.running);
    assert_eq!(report.time_in_state_ms, 20_000);

    assert_eq!(
        runner.command(OperatorCommand::Stop),
        Err(CommandError::NotRunning)
    );
}

#[test]
fn second_start_is_rejected_while_running() {
    let mut runner = started_at(200.0);
    runner.step().unwrap();
    assert_eq!(
        runner.command(OperatorCommand::Start),
        Err(CommandError::AlreadyRunning)
    );
    assert_eq!(runner.controller().state(), CoarseCooldown);
}
