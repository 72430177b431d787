//! Prelude module for common re-exports.
//!
//! ```rust
//! use cryo_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::control_unit::config::{
    ControllerConfig, CryoConfig, CycleConfig, DetectorConfig, HistoryConfig, PlannerConfig,
};

// ─── Controller Types ───────────────────────────────────────────────
pub use crate::control_unit::output::Output;
pub use crate::control_unit::state::{ControllerState, FaultReason, IndicatorMode};

// ─── Driver Seam ────────────────────────────────────────────────────
pub use crate::hal::driver::{CryoDriver, DriverError};
pub use crate::hal::types::{ActuatorCommand, SensorReadings};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{ACTUATOR_FULL_SCALE, MAX_HISTORY_CAPACITY, TICK_INTERVAL_MS};
