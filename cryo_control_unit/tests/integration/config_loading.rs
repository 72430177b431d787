//! Integration test: configuration files drive the runner.

use std::io::Write;
use std::path::PathBuf;

use cryo_common::config::LogLevel;
use cryo_common::control_unit::state::ControllerState;
use cryo_control_unit::command::OperatorCommand;
use cryo_control_unit::config::{LoadError, load_config};
use cryo_control_unit::cycle::CycleRunner;
use cryo_control_unit::hal::simulation::{SimulatedCryostat, SimulationParams};

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("config")
        .join("cryo.toml")
}

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn shipped_config_matches_defaults() {
    let loaded = load_config(&shipped_config()).unwrap();
    let defaults = cryo_common::control_unit::config::CryoConfig::default();

    assert_eq!(loaded.shared.log_level, LogLevel::Info);
    assert_eq!(loaded.cryo.controller.setpoint_k, defaults.controller.setpoint_k);
    assert_eq!(
        loaded.cryo.controller.stall_window_ms,
        defaults.controller.stall_window_ms
    );
    assert_eq!(loaded.cryo.planner.full_scale, defaults.planner.full_scale);
    assert_eq!(loaded.cryo.history.capacity, defaults.history.capacity);
    assert_eq!(
        loaded.cryo.cycle.tick_interval_ms,
        defaults.cycle.tick_interval_ms
    );
}

#[test]
fn shortened_durations_reach_operating_sooner() {
    let file = write_config(
        r#"
[controller]
settle_duration_ms = 2000
baseline_duration_ms = 4000
"#,
    );
    let loaded = load_config(file.path()).unwrap();

    let driver = SimulatedCryostat::new(SimulationParams {
        initial_temp_k: 79.0,
        ..SimulationParams::default()
    });
    let mut runner = CycleRunner::new(loaded.cryo, driver).unwrap();
    runner.command(OperatorCommand::Start).unwrap();
    assert_eq!(runner.controller().state(), ControllerState::Settle);

    let mut reached = None;
    for _ in 0..100 {
        let out = runner.step().unwrap();
        if out.state == ControllerState::Operating {
            reached = Some(runner.now_ms());
            break;
        }
    }
    // Settle at 0, Baseline at 2 000 ms, Operating at 6 000 ms.
    assert_eq!(reached, Some(6_000));
}

#[test]
fn lower_voltage_limit_is_enforced() {
    let file = write_config("[controller]\nmax_line_voltage_v = 110.0\n");
    let loaded = load_config(file.path()).unwrap();

    let mut runner =
        CycleRunner::new(loaded.cryo, SimulatedCryostat::new(SimulationParams::default()))
            .unwrap();
    runner.command(OperatorCommand::Start).unwrap();
    assert_eq!(runner.step().unwrap().state, ControllerState::Fault);
}

#[test]
fn invalid_threshold_ordering_is_rejected() {
    let file = write_config("[controller]\ncoarse_fine_threshold_k = 300.0\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Validation(_)));
}
