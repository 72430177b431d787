//! Configuration structures for the cryocooler control unit.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every field
//! falls back to the matching value in [`crate::consts`] when omitted, so an
//! empty document yields the factory tuning.

use serde::{Deserialize, Serialize};

use crate::consts::{
    ACTUATOR_FULL_SCALE, AMBIENT_START_K, BACKOFF_MAX_COUNT, BACKOFF_STEP,
    BASELINE_DURATION_MS, COARSE_FINE_THRESHOLD_K, HISTORY_SAMPLE_INTERVAL_MS, INIT_AMBER_MS,
    MAX_COOLDOWN_RATE_K_PER_MIN, MAX_HISTORY_CAPACITY, MAX_LINE_VOLTAGE_V,
    MAX_SLEW_STEP_PER_TICK, OVERSTROKE_CURRENT_THRESHOLD_A, OVERSTROKE_DEBOUNCE_MS,
    OVERSTROKE_EMA_ALPHA, OVERSTROKE_PRIME_READINGS, SETPOINT_K, SETPOINT_TOLERANCE_K,
    SETTLE_DURATION_MS, STALL_DETECT_WINDOW_MS, STALL_MIN_DROP_K, STATUS_LOG_INTERVAL_TICKS,
    TEMP_HISTORY_SIZE, TICK_INTERVAL_MS, TICK_INTERVAL_MS_MAX, TICK_INTERVAL_MS_MIN,
};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete tuning set for one apparatus.
///
/// ```toml
/// [controller]
/// setpoint_k = 80.0
///
/// [cycle]
/// tick_interval_ms = 100
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryoConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
}

impl CryoConfig {
    /// Validate every section plus the cross-section ordering
    /// `cold_ref < coarse/fine threshold < warm_ref`.
    pub fn validate(&self) -> Result<(), String> {
        self.controller.validate()?;
        self.planner.validate()?;
        self.detector.validate()?;
        self.history.validate()?;
        self.cycle.validate()?;

        let threshold = self.controller.coarse_fine_threshold_k;
        if !(self.planner.cold_ref_k < threshold && threshold < self.planner.warm_ref_k) {
            return Err(format!(
                "coarse_fine_threshold_k {} must lie between cold_ref_k {} and warm_ref_k {}",
                threshold, self.planner.cold_ref_k, self.planner.warm_ref_k
            ));
        }
        if self.controller.backoff_step > self.planner.full_scale {
            return Err(format!(
                "backoff_step {} exceeds full_scale {}",
                self.controller.backoff_step, self.planner.full_scale
            ));
        }
        Ok(())
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Thermal setpoints, safety limits and state durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Cold-stage setpoint [K].
    #[serde(default = "default_setpoint")]
    pub setpoint_k: f32,

    /// Band half-width around the setpoint [K].
    #[serde(default = "default_tolerance")]
    pub setpoint_tolerance_k: f32,

    /// Coarse/fine cooldown threshold [K].
    #[serde(default = "default_threshold")]
    pub coarse_fine_threshold_k: f32,

    /// Line-voltage ceiling [V].
    #[serde(default = "default_max_voltage")]
    pub max_line_voltage_v: f32,

    /// `Initialize` → `Idle` delay [ms].
    #[serde(default = "default_init_amber")]
    pub init_amber_ms: u64,

    /// Continuous in-band dwell to leave `Settle` [ms].
    #[serde(default = "default_settle")]
    pub settle_duration_ms: u64,

    /// `Baseline` → `Operating` delay [ms].
    #[serde(default = "default_baseline")]
    pub baseline_duration_ms: u64,

    /// Stall detection window [ms].
    #[serde(default = "default_stall_window")]
    pub stall_window_ms: u64,

    /// Minimum drop expected inside the stall window [K].
    #[serde(default = "default_stall_drop")]
    pub stall_min_drop_k: f32,

    /// Actuator reduction per overstroke event [counts].
    #[serde(default = "default_backoff_step")]
    pub backoff_step: u16,

    /// Overstroke events that latch `Fault`.
    #[serde(default = "default_backoff_max")]
    pub backoff_max_count: u16,
}

fn default_setpoint() -> f32 {
    SETPOINT_K
}
fn default_tolerance() -> f32 {
    SETPOINT_TOLERANCE_K
}
fn default_threshold() -> f32 {
    COARSE_FINE_THRESHOLD_K
}
fn default_max_voltage() -> f32 {
    MAX_LINE_VOLTAGE_V
}
fn default_init_amber() -> u64 {
    INIT_AMBER_MS
}
fn default_settle() -> u64 {
    SETTLE_DURATION_MS
}
fn default_baseline() -> u64 {
    BASELINE_DURATION_MS
}
fn default_stall_window() -> u64 {
    STALL_DETECT_WINDOW_MS
}
fn default_stall_drop() -> f32 {
    STALL_MIN_DROP_K
}
fn default_backoff_step() -> u16 {
    BACKOFF_STEP
}
fn default_backoff_max() -> u16 {
    BACKOFF_MAX_COUNT
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            setpoint_k: SETPOINT_K,
            setpoint_tolerance_k: SETPOINT_TOLERANCE_K,
            coarse_fine_threshold_k: COARSE_FINE_THRESHOLD_K,
            max_line_voltage_v: MAX_LINE_VOLTAGE_V,
            init_amber_ms: INIT_AMBER_MS,
            settle_duration_ms: SETTLE_DURATION_MS,
            baseline_duration_ms: BASELINE_DURATION_MS,
            stall_window_ms: STALL_DETECT_WINDOW_MS,
            stall_min_drop_k: STALL_MIN_DROP_K,
            backoff_step: BACKOFF_STEP,
            backoff_max_count: BACKOFF_MAX_COUNT,
        }
    }
}

impl ControllerConfig {
    /// Lower edge of the setpoint band [K].
    #[inline]
    pub fn band_low_k(&self) -> f32 {
        self.setpoint_k - self.setpoint_tolerance_k
    }

    /// Upper edge of the setpoint band [K].
    #[inline]
    pub fn band_high_k(&self) -> f32 {
        self.setpoint_k + self.setpoint_tolerance_k
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.setpoint_tolerance_k <= 0.0 {
            return Err(format!(
                "setpoint_tolerance_k {} must be > 0",
                self.setpoint_tolerance_k
            ));
        }
        if self.band_low_k() <= 0.0 {
            return Err(format!(
                "setpoint band lower edge {} must be above absolute zero",
                self.band_low_k()
            ));
        }
        if self.band_high_k() >= self.coarse_fine_threshold_k {
            return Err(format!(
                "setpoint band upper edge {} must be below coarse_fine_threshold_k {}",
                self.band_high_k(),
                self.coarse_fine_threshold_k
            ));
        }
        if self.max_line_voltage_v <= 0.0 {
            return Err(format!(
                "max_line_voltage_v {} must be > 0",
                self.max_line_voltage_v
            ));
        }
        if self.stall_window_ms == 0 {
            return Err("stall_window_ms must be > 0".to_string());
        }
        if self.stall_min_drop_k <= 0.0 {
            return Err(format!(
                "stall_min_drop_k {} must be > 0",
                self.stall_min_drop_k
            ));
        }
        if self.backoff_max_count == 0 {
            return Err("backoff_max_count must be > 0".to_string());
        }
        Ok(())
    }
}

// ─── Planner ────────────────────────────────────────────────────────

/// Cooldown ramp mapping and actuator slew limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Temperature at which the ramp commands zero [K].
    #[serde(default = "default_warm_ref")]
    pub warm_ref_k: f32,

    /// Temperature at which the ramp commands full scale [K].
    #[serde(default = "default_cold_ref")]
    pub cold_ref_k: f32,

    /// Actuator full-scale level [counts].
    #[serde(default = "default_full_scale")]
    pub full_scale: u16,

    /// Maximum change of the actual level per tick [counts].
    #[serde(default = "default_slew_step")]
    pub max_slew_step: u16,

    /// Rate-guard threshold [K/min].
    #[serde(default = "default_max_rate")]
    pub max_cooldown_rate_k_per_min: f32,
}

fn default_warm_ref() -> f32 {
    AMBIENT_START_K
}
fn default_cold_ref() -> f32 {
    SETPOINT_K
}
fn default_full_scale() -> u16 {
    ACTUATOR_FULL_SCALE
}
fn default_slew_step() -> u16 {
    MAX_SLEW_STEP_PER_TICK
}
fn default_max_rate() -> f32 {
    MAX_COOLDOWN_RATE_K_PER_MIN
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            warm_ref_k: AMBIENT_START_K,
            cold_ref_k: SETPOINT_K,
            full_scale: ACTUATOR_FULL_SCALE,
            max_slew_step: MAX_SLEW_STEP_PER_TICK,
            max_cooldown_rate_k_per_min: MAX_COOLDOWN_RATE_K_PER_MIN,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.cold_ref_k >= self.warm_ref_k {
            return Err(format!(
                "cold_ref_k {} must be below warm_ref_k {}",
                self.cold_ref_k, self.warm_ref_k
            ));
        }
        if self.full_scale == 0 {
            return Err("full_scale must be > 0".to_string());
        }
        if self.max_slew_step == 0 || self.max_slew_step > self.full_scale {
            return Err(format!(
                "max_slew_step {} out of range [1, {}]",
                self.max_slew_step, self.full_scale
            ));
        }
        if self.max_cooldown_rate_k_per_min <= 0.0 {
            return Err(format!(
                "max_cooldown_rate_k_per_min {} must be > 0",
                self.max_cooldown_rate_k_per_min
            ));
        }
        Ok(())
    }
}

// ─── Overstroke Detector ────────────────────────────────────────────

/// Current-spike detector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// EMA smoothing factor, `(0, 1]`.
    #[serde(default = "default_alpha")]
    pub ema_alpha: f32,

    /// Readings used to seed the baseline.
    #[serde(default = "default_prime")]
    pub prime_readings: u16,

    /// Spike threshold above baseline [A].
    #[serde(default = "default_current_threshold")]
    pub current_threshold_a: f32,

    /// Minimum spacing between events [ms].
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

fn default_alpha() -> f32 {
    OVERSTROKE_EMA_ALPHA
}
fn default_prime() -> u16 {
    OVERSTROKE_PRIME_READINGS
}
fn default_current_threshold() -> f32 {
    OVERSTROKE_CURRENT_THRESHOLD_A
}
fn default_debounce() -> u64 {
    OVERSTROKE_DEBOUNCE_MS
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ema_alpha: OVERSTROKE_EMA_ALPHA,
            prime_readings: OVERSTROKE_PRIME_READINGS,
            current_threshold_a: OVERSTROKE_CURRENT_THRESHOLD_A,
            debounce_ms: OVERSTROKE_DEBOUNCE_MS,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(format!("ema_alpha {} out of range (0, 1]", self.ema_alpha));
        }
        if self.current_threshold_a <= 0.0 {
            return Err(format!(
                "current_threshold_a {} must be > 0",
                self.current_threshold_a
            ));
        }
        Ok(())
    }
}

// ─── History ────────────────────────────────────────────────────────

/// Temperature history sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Retained samples, `[2, MAX_HISTORY_CAPACITY]`.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Interval between pushed samples [ms].
    #[serde(default = "default_sample_interval")]
    pub sample_interval_ms: u64,
}

fn default_capacity() -> usize {
    TEMP_HISTORY_SIZE
}
fn default_sample_interval() -> u64 {
    HISTORY_SAMPLE_INTERVAL_MS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: TEMP_HISTORY_SIZE,
            sample_interval_ms: HISTORY_SAMPLE_INTERVAL_MS,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity < 2 || self.capacity > MAX_HISTORY_CAPACITY {
            return Err(format!(
                "history capacity {} out of range [2, {}]",
                self.capacity, MAX_HISTORY_CAPACITY
            ));
        }
        if self.sample_interval_ms == 0 {
            return Err("sample_interval_ms must be > 0".to_string());
        }
        Ok(())
    }
}

// ─── Cycle ──────────────────────────────────────────────────────────

/// Control loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Tick interval [ms].
    #[serde(default = "default_tick")]
    pub tick_interval_ms: u64,

    /// Ticks between status log lines.
    #[serde(default = "default_status_interval")]
    pub status_log_interval_ticks: u32,
}

fn default_tick() -> u64 {
    TICK_INTERVAL_MS
}
fn default_status_interval() -> u32 {
    STATUS_LOG_INTERVAL_TICKS
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            status_log_interval_ticks: STATUS_LOG_INTERVAL_TICKS,
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms < TICK_INTERVAL_MS_MIN
            || self.tick_interval_ms > TICK_INTERVAL_MS_MAX
        {
            return Err(format!(
                "tick_interval_ms {} out of range [{}, {}]",
                self.tick_interval_ms, TICK_INTERVAL_MS_MIN, TICK_INTERVAL_MS_MAX
            ));
        }
        if self.status_log_interval_ticks == 0 {
            return Err("status_log_interval_ticks must be > 0".to_string());
        }
        Ok(())
    }
}
