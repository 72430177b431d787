//! Supervisory state machine.

pub mod controller;
pub mod indicators;
