//! Default tuning values for the cryocooler control workspace.
//!
//! Single source of truth for every numeric default and limit. The config
//! structs in [`crate::control_unit::config`] fall back to these values for
//! any field omitted from TOML.

use static_assertions::const_assert;

// ─── Thermal targets ────────────────────────────────────────────────

/// Cold-stage setpoint [K].
pub const SETPOINT_K: f32 = 78.0;

/// Half-width of the tolerance band around the setpoint [K].
pub const SETPOINT_TOLERANCE_K: f32 = 2.0;

/// Coarse/fine cooldown threshold [K].
pub const COARSE_FINE_THRESHOLD_K: f32 = 85.0;

/// Ambient (warm) reference of the cooldown ramp [K].
pub const AMBIENT_START_K: f32 = 295.0;

/// Cooling rate above which the ramp target is held [K/min].
pub const MAX_COOLDOWN_RATE_K_PER_MIN: f32 = 1.0;

// ─── Actuator ───────────────────────────────────────────────────────

/// Actuator full-scale level (12-bit DAC).
pub const ACTUATOR_FULL_SCALE: u16 = 4095;

/// Maximum actuator change per control tick [counts].
pub const MAX_SLEW_STEP_PER_TICK: u16 = 5;

// ─── Timing ─────────────────────────────────────────────────────────

/// Control tick interval [ms].
pub const TICK_INTERVAL_MS: u64 = 200;

/// Tick interval bounds accepted by config validation [ms].
pub const TICK_INTERVAL_MS_MIN: u64 = 10;
pub const TICK_INTERVAL_MS_MAX: u64 = 10_000;

/// Power-up amber lamp-test period before `Idle` [ms].
pub const INIT_AMBER_MS: u64 = 1_500;

/// Continuous in-band dwell required to leave `Settle` [ms].
pub const SETTLE_DURATION_MS: u64 = 60_000;

/// Baseline collection period before `Operating` [ms].
pub const BASELINE_DURATION_MS: u64 = 300_000;

// ─── Stall detection ────────────────────────────────────────────────

/// Trailing window scanned for stall detection [ms].
pub const STALL_DETECT_WINDOW_MS: u64 = 600_000;

/// Minimum temperature drop expected inside the stall window [K].
pub const STALL_MIN_DROP_K: f32 = 1.0;

// ─── Temperature history ────────────────────────────────────────────

/// Default number of retained temperature samples.
pub const TEMP_HISTORY_SIZE: usize = 20;

/// Upper bound on history capacity (backing storage size).
pub const MAX_HISTORY_CAPACITY: usize = 64;

/// Interval between samples pushed into the history [ms].
pub const HISTORY_SAMPLE_INTERVAL_MS: u64 = 30_000;

// ─── Electrical safety ──────────────────────────────────────────────

/// Line-voltage safety ceiling [V].
pub const MAX_LINE_VOLTAGE_V: f32 = 120.0;

// ─── Overstroke (current spike) detection ───────────────────────────

/// EMA smoothing factor for the current baseline.
pub const OVERSTROKE_EMA_ALPHA: f32 = 0.08;

/// Readings used to seed the baseline before detection is armed.
pub const OVERSTROKE_PRIME_READINGS: u16 = 20;

/// Spike threshold above baseline [A].
pub const OVERSTROKE_CURRENT_THRESHOLD_A: f32 = 2.0;

/// Minimum time between two logical overstroke events [ms].
pub const OVERSTROKE_DEBOUNCE_MS: u64 = 2_000;

// ─── Backoff ────────────────────────────────────────────────────────

/// Actuator reduction applied per overstroke event [counts].
pub const BACKOFF_STEP: u16 = 200;

/// Overstroke events tolerated before `Fault(ExcessiveBackoff)`.
pub const BACKOFF_MAX_COUNT: u16 = 10;

// ─── Runner ─────────────────────────────────────────────────────────

/// Ticks between periodic status log lines.
pub const STATUS_LOG_INTERVAL_TICKS: u32 = 25;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/cryo.toml";

/// Canonical service name.
pub const SERVICE_NAME: &str = "cryo_control_unit";

const_assert!(TEMP_HISTORY_SIZE >= 2);
const_assert!(TEMP_HISTORY_SIZE <= MAX_HISTORY_CAPACITY);
const_assert!(BACKOFF_STEP <= ACTUATOR_FULL_SCALE);
const_assert!(TICK_INTERVAL_MS >= TICK_INTERVAL_MS_MIN && TICK_INTERVAL_MS <= TICK_INTERVAL_MS_MAX);
const_assert!(BACKOFF_MAX_COUNT > 0);
