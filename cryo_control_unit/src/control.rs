//! Actuator planning.
//!
//! Stateless level mapping in [`planner`], cumulative overstroke backoff in
//! [`backoff`], and the per-tick rate limiter in [`slew`].

pub mod backoff;
pub mod planner;
pub mod slew;
