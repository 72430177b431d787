//! Signal analytics fed once per tick by the cycle runner.
//!
//! - [`history`]: fixed-capacity temperature ring with cooling rate and stall scan
//! - [`current`]: EMA current baseline with debounced spike detection

pub mod current;
pub mod history;
