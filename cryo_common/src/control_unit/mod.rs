//! Control unit shared types.
//!
//! State enums, the per-tick `Output` record and the configuration
//! structures consumed by `cryo_control_unit`.

pub mod config;
pub mod output;
pub mod state;
