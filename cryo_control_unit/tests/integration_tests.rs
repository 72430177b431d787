//! Integration tests for the Cryo Control Unit.
//!
//! These tests drive the full cycle runner against the simulated cryostat:
//! cooldown sequencing, safety faults, warm restart and configuration.

mod integration;
