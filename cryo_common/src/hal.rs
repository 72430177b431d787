//! Driver seam between the control core and the cryostat hardware.
//!
//! The control unit talks to acquisition and output hardware only through
//! the [`driver::CryoDriver`] trait and the plain records in [`types`].

pub mod driver;
pub mod types;
