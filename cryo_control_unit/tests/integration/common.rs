//! Shared helpers for the integration tests.

use cryo_common::control_unit::config::CryoConfig;
use cryo_common::control_unit::state::ControllerState;
use cryo_control_unit::command::OperatorCommand;
use cryo_control_unit::cycle::CycleRunner;
use cryo_control_unit::hal::simulation::{SimulatedCryostat, SimulationParams};

pub type SimRunner = CycleRunner<SimulatedCryostat>;

pub fn runner_with(params: SimulationParams) -> SimRunner {
    CycleRunner::new(CryoConfig::default(), SimulatedCryostat::new(params)).unwrap()
}

/// Runner with the cryostat at `initial_temp_k`, already started.
pub fn started_at(initial_temp_k: f32) -> SimRunner {
    let mut runner = runner_with(SimulationParams {
        initial_temp_k,
        ..SimulationParams::default()
    });
    runner.command(OperatorCommand::Start).unwrap();
    runner
}

/// Step until `state` is reached or `limit_ms` of controller time passes.
/// Returns the time at which `state` was first observed.
pub fn run_until_state(runner: &mut SimRunner, state: ControllerState, limit_ms: u64) -> Option<u64> {
    while runner.now_ms() < limit_ms {
        let out = runner.step().unwrap();
        if out.state == state {
            return Some(runner.now_ms());
        }
    }
    None
}

/// Step until `pred` holds on the latest temperature.
pub fn run_until_temp(runner: &mut SimRunner, limit_ms: u64, pred: impl Fn(f32) -> bool) -> bool {
    while runner.now_ms() < limit_ms {
        runner.step().unwrap();
        if pred(runner.readings().temperature_k) {
            return true;
        }
    }
    false
}
