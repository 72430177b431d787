//! Cryo Common Library
//!
//! This crate provides shared types, default constants and configuration
//! loading utilities for the cryocooler control workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Default tuning values and compile-time limits
//! - [`config`] - Configuration loading traits and types
//! - [`control_unit`] - Controller state enums, `Output` record and config structs
//! - [`conversions`] - Pure temperature / sensor conversion helpers
//! - [`hal`] - Driver trait and the command / readings records
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use cryo_common::prelude::*;
//!
//! let cfg = CryoConfig::default();
//! assert!(cfg.validate().is_ok());
//! assert_eq!(ControllerState::default(), ControllerState::Off);
//! ```

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod conversions;
pub mod hal;
pub mod prelude;
