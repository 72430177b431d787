//! Slew limiter owning the actual actuator level.

use super::planner::ramp_toward;

/// Applies [`ramp_toward`] once per tick to the level actually sent to the
/// actuator.
#[derive(Debug, Clone)]
pub struct SlewLimiter {
    level: u16,
    max_step: u16,
}

impl SlewLimiter {
    /// Start at level 0. A `max_step` of 0 is treated as 1.
    pub fn new(max_step: u16) -> Self {
        Self {
            level: 0,
            max_step: max_step.max(1),
        }
    }

    /// Advance one tick toward `target`; returns the new level.
    #[inline]
    pub fn step(&mut self, target: u16) -> u16 {
        self.level = ramp_toward(self.level, target, self.max_step);
        self.level
    }

    #[inline]
    pub fn level(&self) -> u16 {
        self.level
    }

    /// Jump straight to `level` without slewing.
    #[inline]
    pub fn reset_to(&mut self, level: u16) {
        self.level = level;
    }

    /// Ticks needed to reach `target` from the current level.
    pub fn ticks_to_reach(&self, target: u16) -> u32 {
        (self.level.abs_diff(target) as u32).div_ceil(self.max_step as u32)
    }
}
