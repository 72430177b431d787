//! Fixed-cadence control cycle: read → analyse → decide → write.
//!
//! The `CycleRunner` owns exactly one driver, one temperature history, one
//! overstroke detector, one supervisory controller and one slew limiter.
//! It is the only component that reads a clock.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to the chosen CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! All four are no-ops without the `rt` feature.
//!
//! ## Cycle Body
//! 1. Driver applies the previous command and returns fresh readings.
//! 2. History sample every `history.sample_interval_ms`; detector sample
//!    every tick.
//! 3. Controller update; the pending overstroke flag is acknowledged once
//!    the controller has seen it.
//! 4. Slew limiter advances the actual level (`Fault` and `Off` force it to
//!    zero); the new command is stored for the next driver cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cryo_common::control_unit::config::CryoConfig;
use cryo_common::control_unit::output::Output;
use cryo_common::control_unit::state::ControllerState;
use cryo_common::conversions::{format_hms, kelvin_to_celsius};
use cryo_common::hal::driver::{CryoDriver, DriverError};
use cryo_common::hal::types::{ActuatorCommand, SensorReadings};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analytics::current::CurrentAnomalyDetector;
use crate::analytics::history::TemperatureHistory;
use crate::command::{self, CommandError, CommandReply, OperatorCommand};
use crate::control::slew::SlewLimiter;
use crate::state::controller::{SupervisoryController, TickInputs};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: u64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: u64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for average computation.
    pub sum_cycle_ns: u128,
    /// Number of cycles that exceeded the tick interval.
    pub overruns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns as u128;
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            (self.sum_cycle_ns / self.cycle_count as u128) as u64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Cycle loop errors.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT setup failed (mlockall, affinity, scheduler).
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Driver failure.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Configuration rejected by validation.
    #[error("config error: {0}")]
    Config(String),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockAllFlags, mlockall};
    mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop does not page-fault later.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Perform the RT setup sequence. Must be called before [`CycleRunner::run`].
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Run Options ────────────────────────────────────────────────────

/// How [`CycleRunner::run`] paces and terminates the loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Advance a simulated clock by one tick per cycle instead of sleeping.
    pub fast: bool,
    /// Power up from `Off` and issue `start` once `Idle` is reached.
    pub auto_start: bool,
    /// Stop once the runner clock reaches this many ms.
    pub run_for_ms: Option<u64>,
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// The control loop.
pub struct CycleRunner<D: CryoDriver> {
    config: CryoConfig,
    driver: D,
    controller: SupervisoryController,
    history: TemperatureHistory,
    detector: CurrentAnomalyDetector,
    slew: SlewLimiter,
    stats: CycleStats,

    readings: SensorReadings,
    command: ActuatorCommand,
    last_output: Output,
    now_ms: u64,
    last_history_push_ms: Option<u64>,
    tick_count: u64,
    auto_start_pending: bool,
}

impl<D: CryoDriver> CycleRunner<D> {
    /// Validate `config`, initialize the driver and take the first reading.
    pub fn new(config: CryoConfig, mut driver: D) -> Result<Self, CycleError> {
        config.validate().map_err(CycleError::Config)?;
        driver.init()?;
        let command = ActuatorCommand::default();
        let readings = driver.cycle(&command, Duration::ZERO)?;
        info!(
            driver = driver.name(),
            version = driver.version(),
            temperature_k = readings.temperature_k,
            "Driver ready"
        );

        Ok(Self {
            controller: SupervisoryController::from_config(&config),
            history: TemperatureHistory::new(config.history.capacity),
            detector: CurrentAnomalyDetector::new(&config.detector),
            slew: SlewLimiter::new(config.planner.max_slew_step),
            stats: CycleStats::new(),
            config,
            driver,
            readings,
            command,
            last_output: Output::default(),
            now_ms: 0,
            last_history_push_ms: None,
            tick_count: 0,
            auto_start_pending: false,
        })
    }

    // ─── Cycle Body ─────────────────────────────────────────────────

    /// Run one cycle at `now_ms` (monotonic, never earlier than the
    /// previous tick).
    pub fn tick(&mut self, now_ms: u64) -> Result<Output, CycleError> {
        let dt = Duration::from_millis(now_ms.saturating_sub(self.now_ms));
        self.now_ms = now_ms.max(self.now_ms);
        let now = self.now_ms;

        // ═══ READ ═══
        self.readings = self.driver.cycle(&self.command, dt)?;
        let temp = self.readings.temperature_k;

        // ═══ ANALYSE ═══
        let push_due = self
            .last_history_push_ms
            .is_none_or(|last| now.saturating_sub(last) >= self.config.history.sample_interval_ms);
        if push_due {
            self.history.push_sample(now, temp);
            self.last_history_push_ms = Some(now);
        }
        self.detector.sample(self.readings.current_a, now);

        let window = self.config.controller.stall_window_ms;
        let stalled = self.controller.on_duration(now) >= window
            && self
                .history
                .is_stalled(window, self.config.controller.stall_min_drop_k);

        // ═══ DECIDE ═══
        let inputs = TickInputs {
            temperature_k: temp,
            cooling_rate_k_per_min: self.history.cooling_rate_k_per_min(),
            line_voltage_v: self.readings.line_voltage_v,
            stalled,
            overstroke: self.detector.has_flag(),
            now_ms: now,
        };
        let output = self.controller.update(&inputs);
        if inputs.overstroke {
            self.detector.clear();
        }

        // ═══ WRITE ═══
        // Fault and Off cut the actuator at once; slewing applies only to
        // planned targets.
        let level = if matches!(output.state, ControllerState::Fault | ControllerState::Off) {
            self.slew.reset_to(0);
            0
        } else {
            self.slew.step(output.actuator_target)
        };
        self.command = ActuatorCommand::from_output(&output, level);
        self.last_output = output;
        self.tick_count += 1;

        if self.auto_start_pending && output.state == ControllerState::Idle {
            self.auto_start_pending = false;
            if let Err(e) = self.command(OperatorCommand::Start) {
                warn!("auto-start rejected: {e}");
            }
        }

        if self.tick_count % self.config.cycle.status_log_interval_ticks as u64 == 0 {
            self.log_status(&inputs, level);
        }

        Ok(output)
    }

    /// Run one cycle one tick interval after the previous one.
    pub fn step(&mut self) -> Result<Output, CycleError> {
        self.tick(self.now_ms + self.config.cycle.tick_interval_ms)
    }

    fn log_status(&self, inputs: &TickInputs, level: u16) {
        let out = &self.last_output;
        info!(
            state = %out.state,
            temperature_k = inputs.temperature_k,
            temperature_c = kelvin_to_celsius(inputs.temperature_k),
            rate_k_per_min = inputs.cooling_rate_k_per_min,
            line_voltage_v = inputs.line_voltage_v,
            target = out.actuator_target,
            level,
            backoff = out.backoff_event_count,
            cooldown_pct = self.controller.planner().cooldown_percent(inputs.temperature_k),
            on_time = %format_hms(self.controller.on_duration(inputs.now_ms)),
            "{}",
            out.status_text
        );
    }

    // ─── Operator Commands ──────────────────────────────────────────

    /// Apply an operator command at the runner's current time.
    pub fn command(&mut self, cmd: OperatorCommand) -> Result<CommandReply, CommandError> {
        let reply = command::dispatch(
            &mut self.controller,
            cmd,
            self.now_ms,
            self.readings.temperature_k,
        )?;
        if cmd == OperatorCommand::PowerUp {
            self.detector.reset();
        }
        Ok(reply)
    }

    // ─── Loop ───────────────────────────────────────────────────────

    /// Run until `running` is cleared or `options.run_for_ms` elapses.
    pub fn run(&mut self, running: &AtomicBool, options: &RunOptions) -> Result<(), CycleError> {
        if options.auto_start {
            match self.controller.state() {
                ControllerState::Off => match self.command(OperatorCommand::PowerUp) {
                    Ok(_) => self.auto_start_pending = true,
                    Err(e) => warn!("auto power-up rejected: {e}"),
                },
                ControllerState::Idle => {
                    if let Err(e) = self.command(OperatorCommand::Start) {
                        warn!("auto-start rejected: {e}");
                    }
                }
                _ => {}
            }
        }

        let result = if options.fast {
            self.run_fast_loop(running, options)
        } else {
            self.run_paced_loop(running, options)
        };

        info!(
            cycles = self.stats.cycle_count,
            avg_cycle_us = self.stats.avg_cycle_ns() / 1000,
            max_cycle_us = self.stats.max_cycle_ns / 1000,
            overruns = self.stats.overruns,
            final_state = %self.controller.state(),
            "Control loop finished"
        );
        result
    }

    /// Simulated clock: one tick per cycle, no sleeping.
    fn run_fast_loop(&mut self, running: &AtomicBool, options: &RunOptions) -> Result<(), CycleError> {
        while running.load(Ordering::SeqCst) && !self.deadline_reached(options) {
            let cycle_start = Instant::now();
            self.step()?;
            self.stats.record(cycle_start.elapsed().as_nanos() as u64);
        }
        Ok(())
    }

    /// Wall clock with `std::thread::sleep` pacing.
    fn run_paced_loop(&mut self, running: &AtomicBool, options: &RunOptions) -> Result<(), CycleError> {
        let tick = Duration::from_millis(self.config.cycle.tick_interval_ms);
        let origin = Instant::now();
        let base_ms = self.now_ms;

        while running.load(Ordering::SeqCst) && !self.deadline_reached(options) {
            let cycle_start = Instant::now();
            let now_ms = base_ms + origin.elapsed().as_millis() as u64;

            self.tick(now_ms)?;

            let elapsed = cycle_start.elapsed();
            self.stats.record(elapsed.as_nanos() as u64);
            match tick.checked_sub(elapsed) {
                Some(remaining) => std::thread::sleep(remaining),
                None => {
                    self.stats.overruns += 1;
                    debug!(elapsed_us = elapsed.as_micros() as u64, "cycle overrun");
                }
            }
        }
        Ok(())
    }

    fn deadline_reached(&self, options: &RunOptions) -> bool {
        options.run_for_ms.is_some_and(|limit| self.now_ms >= limit)
    }

    /// Shut the driver down. Outputs are de-energised by the driver.
    pub fn shutdown(&mut self) -> Result<(), CycleError> {
        self.driver.shutdown()?;
        Ok(())
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn controller(&self) -> &SupervisoryController {
        &self.controller
    }

    #[inline]
    pub fn history(&self) -> &TemperatureHistory {
        &self.history
    }

    #[inline]
    pub fn detector(&self) -> &CurrentAnomalyDetector {
        &self.detector
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Slew-limited level sent with the latest command.
    #[inline]
    pub fn actuator_level(&self) -> u16 {
        self.slew.level()
    }

    #[inline]
    pub fn readings(&self) -> &SensorReadings {
        &self.readings
    }

    #[inline]
    pub fn last_output(&self) -> &Output {
        &self.last_output
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
