//! # Cryo Control Unit Library
//!
//! Supervisory controller for a closed-loop cryogenic cooling apparatus.
//! Drives the cooling actuator toward the cold-stage setpoint, enforces
//! thermal and electrical safety limits and exposes operator start / stop /
//! off control.
//!
//! ## Per-Tick Flow
//!
//! 1. The driver returns fresh sensor readings.
//! 2. [`analytics`] turns them into a cooling rate, a stall flag and an
//!    overstroke flag.
//! 3. [`state::controller::SupervisoryController::update`] applies the
//!    global safety guard, then the per-state transition table, and emits
//!    an `Output`.
//! 4. [`control::slew::SlewLimiter`] moves the actual actuator level toward
//!    the planned target.
//!
//! The core never reads a clock, never blocks and never allocates inside
//! the tick. Time is supplied by [`cycle::CycleRunner`].

pub mod analytics;
pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod hal;
pub mod state;
