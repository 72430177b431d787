//! Driver implementations.
//!
//! Only the simulated cryostat ships with the crate; hardware drivers
//! implement `cryo_common::hal::driver::CryoDriver` out of tree.

pub mod simulation;
