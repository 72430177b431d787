//! Simulated cryostat.
//!
//! The `SimulatedCryostat` implements `CryoDriver` with a lumped thermal
//! model of the cold stage, a drive-current model and a fixed line voltage,
//! for development and testing without hardware.
//!
//! ## Thermal model
//!
//! With the bypass relay engaged the actuator level drives the cold stage
//! directly:
//!
//! ```text
//! dT/dt = −gain · u · (T − T_floor) + leak · (T_ambient − T)      u = level / full_scale
//! ```
//!
//! With the bypass released (circuits on Normal) the on-board regulator
//! holds the stage, modelled as a first-order approach to its setpoint.

use cryo_common::consts::{ACTUATOR_FULL_SCALE, AMBIENT_START_K, SETPOINT_K};
use cryo_common::hal::driver::{CryoDriver, DriverError};
use cryo_common::hal::types::{ActuatorCommand, SensorReadings};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Plant parameters.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    /// Cold-stage temperature at init [K].
    pub initial_temp_k: f32,
    /// Ambient temperature the stage leaks toward [K].
    pub ambient_k: f32,
    /// Lowest temperature the cold head can reach [K].
    pub cold_head_floor_k: f32,
    /// Cooling coefficient at full actuator level [1/s].
    pub cooling_gain_per_s: f32,
    /// Heat-leak coefficient [1/s].
    pub heat_leak_per_s: f32,
    /// Setpoint held by the on-board regulator [K].
    pub regulator_setpoint_k: f32,
    /// Time constant of the on-board regulator [s].
    pub regulator_time_constant_s: f32,
    /// Actuator full scale [counts].
    pub full_scale: u16,
    /// Drive current at level 0 [A].
    pub idle_current_a: f32,
    /// Additional drive current at full scale [A].
    pub full_load_current_a: f32,
    /// Inject a current spike every N ms of simulated time.
    pub spike_every_ms: Option<u64>,
    /// Spike height above the modelled current [A].
    pub spike_amplitude_a: f32,
    /// Line voltage [V].
    pub line_voltage_v: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_temp_k: 290.0,
            ambient_k: AMBIENT_START_K,
            cold_head_floor_k: 60.0,
            cooling_gain_per_s: 0.01,
            heat_leak_per_s: 0.0005,
            regulator_setpoint_k: SETPOINT_K,
            regulator_time_constant_s: 60.0,
            full_scale: ACTUATOR_FULL_SCALE,
            idle_current_a: 0.5,
            full_load_current_a: 4.0,
            spike_every_ms: None,
            spike_amplitude_a: 6.0,
            line_voltage_v: 115.0,
        }
    }
}

/// Simulation driver implementing `CryoDriver`.
pub struct SimulatedCryostat {
    params: SimulationParams,
    initialized: bool,
    temperature_k: f32,
    line_voltage_v: f32,
    elapsed_ms: u64,
    next_spike_ms: Option<u64>,
    last_command: ActuatorCommand,
}

impl SimulatedCryostat {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            temperature_k: params.initial_temp_k,
            line_voltage_v: params.line_voltage_v,
            next_spike_ms: params.spike_every_ms,
            params,
            initialized: false,
            elapsed_ms: 0,
            last_command: ActuatorCommand::default(),
        }
    }

    /// Force the cold-stage temperature (fault injection in tests).
    pub fn set_temperature(&mut self, temperature_k: f32) {
        self.temperature_k = temperature_k;
    }

    /// Change the line voltage from the next cycle on.
    pub fn set_line_voltage(&mut self, line_voltage_v: f32) {
        self.line_voltage_v = line_voltage_v;
    }

    #[inline]
    pub fn temperature(&self) -> f32 {
        self.temperature_k
    }

    /// Simulated time accumulated over all cycles [ms].
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Command applied by the most recent cycle.
    #[inline]
    pub fn last_command(&self) -> &ActuatorCommand {
        &self.last_command
    }

    fn step_thermal(&mut self, command: &ActuatorCommand, dt_s: f32) {
        let p = &self.params;
        let t = self.temperature_k;

        if command.bypass_relay {
            let u = command.level.min(p.full_scale) as f32 / p.full_scale as f32;
            let cooling = p.cooling_gain_per_s * u * (t - p.cold_head_floor_k);
            let leak = p.heat_leak_per_s * (p.ambient_k - t);
            self.temperature_k = (t + (leak - cooling) * dt_s).max(p.cold_head_floor_k);
        } else {
            let k = (dt_s / p.regulator_time_constant_s).min(1.0);
            self.temperature_k = t + (p.regulator_setpoint_k - t) * k;
        }
    }

    fn drive_current(&mut self, level: u16) -> f32 {
        let p = &self.params;
        let u = level.min(p.full_scale) as f32 / p.full_scale as f32;
        let mut current = p.idle_current_a + u * p.full_load_current_a;

        if let (Some(period), Some(next)) = (p.spike_every_ms, self.next_spike_ms) {
            if self.elapsed_ms >= next {
                current += p.spike_amplitude_a;
                self.next_spike_ms = Some(next + period.max(1));
                debug!(elapsed_ms = self.elapsed_ms, current, "injected current spike");
            }
        }
        current
    }
}

impl Default for SimulatedCryostat {
    fn default() -> Self {
        Self::new(SimulationParams::default())
    }
}

impl CryoDriver for SimulatedCryostat {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self) -> Result<(), DriverError> {
        if self.params.full_scale == 0 {
            return Err(DriverError::InitFailed(
                "full_scale must be > 0".to_string(),
            ));
        }
        if self.params.regulator_time_constant_s <= 0.0 {
            return Err(DriverError::InitFailed(
                "regulator_time_constant_s must be > 0".to_string(),
            ));
        }
        self.initialized = true;
        info!(
            initial_temp_k = self.temperature_k,
            line_voltage_v = self.line_voltage_v,
            spike_every_ms = ?self.params.spike_every_ms,
            "Simulated cryostat initialized"
        );
        Ok(())
    }

    fn cycle(
        &mut self,
        command: &ActuatorCommand,
        dt: Duration,
    ) -> Result<SensorReadings, DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }

        self.step_thermal(command, dt.as_secs_f32());
        self.elapsed_ms += dt.as_millis() as u64;
        let current_a = self.drive_current(command.level);
        self.last_command = *command;

        let readings = SensorReadings {
            temperature_k: self.temperature_k,
            current_a,
            line_voltage_v: self.line_voltage_v,
        };
        trace!(?readings, level = command.level, "simulation cycle");
        Ok(readings)
    }

    fn shutdown(&mut self) -> Result<(), DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }
        info!("Shutting down simulated cryostat");
        self.last_command = ActuatorCommand::default();
        self.initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(200);

    fn cryostat(params: SimulationParams) -> SimulatedCryostat {
        let mut sim = SimulatedCryostat::new(params);
        sim.init().unwrap();
        sim
    }

    fn bypass(level: u16) -> ActuatorCommand {
        ActuatorCommand {
            level,
            ..ActuatorCommand::default()
        }
    }

    #[test]
    fn cycle_before_init_fails() {
        let mut sim = SimulatedCryostat::default();
        assert!(matches!(
            sim.cycle(&ActuatorCommand::default(), TICK),
            Err(DriverError::NotInitialized)
        ));
    }

    #[test]
    fn zero_level_warms_toward_ambient() {
        let mut sim = cryostat(SimulationParams {
            initial_temp_k: 200.0,
            ..SimulationParams::default()
        });
        let r = sim.cycle(&bypass(0), Duration::from_secs(10)).unwrap();
        assert!(r.temperature_k > 200.0);
        assert!(r.temperature_k < 295.0);
    }

    #[test]
    fn full_level_cools() {
        let mut sim = cryostat(SimulationParams::default());
        let mut last = sim.temperature();
        for _ in 0..50 {
            let r = sim.cycle(&bypass(4095), TICK).unwrap();
            assert!(r.temperature_k < last);
            last = r.temperature_k;
        }
    }

    #[test]
    fn temperature_never_below_floor() {
        let mut sim = cryostat(SimulationParams {
            initial_temp_k: 61.0,
            cooling_gain_per_s: 10.0,
            ..SimulationParams::default()
        });
        let r = sim.cycle(&bypass(4095), Duration::from_secs(5)).unwrap();
        assert_eq!(r.temperature_k, 60.0);
    }

    #[test]
    fn regulator_holds_setpoint_when_bypass_released() {
        let mut sim = cryostat(SimulationParams {
            initial_temp_k: 76.0,
            ..SimulationParams::default()
        });
        let cmd = ActuatorCommand {
            bypass_relay: false,
            ..ActuatorCommand::default()
        };
        for _ in 0..3000 {
            sim.cycle(&cmd, TICK).unwrap();
        }
        assert!((sim.temperature() - 78.0).abs() < 0.01);
    }

    #[test]
    fn current_tracks_level_and_spikes() {
        let mut sim = cryostat(SimulationParams {
            spike_every_ms: Some(1_000),
            ..SimulationParams::default()
        });
        let r = sim.cycle(&bypass(0), TICK).unwrap();
        assert!((r.current_a - 0.5).abs() < 1e-6);
        let mut spikes = 0;
        for _ in 0..24 {
            let r = sim.cycle(&bypass(0), TICK).unwrap();
            if r.current_a > 5.0 {
                spikes += 1;
            }
        }
        // 5 s of simulated time with one spike per second.
        assert_eq!(sim.elapsed_ms(), 5_000);
        assert_eq!(spikes, 5);
    }

    #[test]
    fn line_voltage_can_be_changed() {
        let mut sim = cryostat(SimulationParams::default());
        assert_eq!(sim.cycle(&bypass(0), TICK).unwrap().line_voltage_v, 115.0);
        sim.set_line_voltage(125.0);
        assert_eq!(sim.cycle(&bypass(0), TICK).unwrap().line_voltage_v, 125.0);
    }

    #[test]
    fn shutdown_resets_command() {
        let mut sim = cryostat(SimulationParams::default());
        sim.cycle(&bypass(100), TICK).unwrap();
        assert_eq!(sim.last_command().level, 100);
        sim.shutdown().unwrap();
        assert_eq!(sim.last_command().level, 0);
        assert!(sim.shutdown().is_err());
        assert_eq!(sim.name(), "simulation");
    }
}
