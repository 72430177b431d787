//! # Cryo Control Unit
//!
//! Supervisory control loop for a closed-loop cryocooler, running against
//! the simulated cryostat.
//!
//! Loads one TOML file (`[shared]` plus the tuning sections), performs RT
//! setup, and enters the fixed-cadence cycle until Ctrl-C or `--run-for-ms`.

use clap::Parser;
use cryo_common::consts::DEFAULT_CONFIG_PATH;
use cryo_control_unit::config::{LoadedConfig, load_config};
use cryo_control_unit::cycle::{CycleRunner, RunOptions, rt_setup};
use cryo_control_unit::hal::simulation::{SimulatedCryostat, SimulationParams};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Cryo Control Unit: cryocooler supervisory controller
#[derive(Parser, Debug)]
#[command(name = "cryo_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Supervisory control loop for a closed-loop cryocooler")]
struct Args {
    /// Path to the configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Advance a simulated clock instead of sleeping between ticks.
    #[arg(long)]
    fast: bool,

    /// Power up and start cooling without operator input.
    #[arg(long)]
    auto_start: bool,

    /// Stop after this many ms of controller time.
    #[arg(long, value_name = "MS")]
    run_for_ms: Option<u64>,

    /// Initial cold-stage temperature of the simulated cryostat [K].
    #[arg(long, default_value_t = 290.0)]
    initial_temp_k: f32,

    /// Simulated line voltage [V].
    #[arg(long, default_value_t = 115.0)]
    line_voltage: f32,

    /// Inject a drive-current spike every N ms of simulated time.
    #[arg(long, value_name = "MS")]
    spike_every_ms: Option<u64>,

    /// CPU core to pin the control thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = load_config(&args.config);

    let directive = match &loaded {
        Ok(cfg) if !args.verbose => cfg.shared.log_level.as_directive(),
        Ok(_) => "debug",
        Err(_) if args.verbose => "debug",
        Err(_) => "info",
    };
    setup_tracing(directive, args.json);

    info!("Cryo Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|cfg| run(&args, cfg));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Cryo Control Unit shutdown complete");
}

fn run(args: &Args, loaded: LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %loaded.shared.service_name,
        tick_ms = loaded.cryo.cycle.tick_interval_ms,
        setpoint_k = loaded.cryo.controller.setpoint_k,
        "Config OK from {}",
        args.config.display()
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let driver = SimulatedCryostat::new(SimulationParams {
        initial_temp_k: args.initial_temp_k,
        line_voltage_v: args.line_voltage,
        spike_every_ms: args.spike_every_ms,
        full_scale: loaded.cryo.planner.full_scale,
        regulator_setpoint_k: loaded.cryo.controller.setpoint_k,
        ..SimulationParams::default()
    });
    let mut runner = CycleRunner::new(loaded.cryo, driver)?;
    info!("CycleRunner initialized, entering control loop");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let options = RunOptions {
        fast: args.fast,
        auto_start: args.auto_start,
        run_for_ms: args.run_for_ms,
    };
    let loop_result = runner.run(&running, &options);
    runner.shutdown()?;
    loop_result?;

    let out = runner.last_output();
    info!(
        state = %out.state,
        temperature_k = runner.readings().temperature_k,
        "{}",
        out.status_text
    );
    Ok(())
}

fn setup_tracing(directive: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
