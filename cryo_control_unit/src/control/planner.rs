//! Actuator target planning.
//!
//! Free functions implement the individual steps; [`ActuatorPlanner`] binds
//! them to a [`PlannerConfig`] for the controller.

use cryo_common::control_unit::config::PlannerConfig;
use cryo_common::conversions;
use tracing::trace;

// ─── Level Mapping ──────────────────────────────────────────────────

/// Map a cold-stage temperature onto the cooldown ramp.
///
/// Zero at or above `warm_ref_k`, `full_scale` at or below `cold_ref_k`,
/// linear (rounded) in between.
pub fn temperature_to_level(temp_k: f32, warm_ref_k: f32, cold_ref_k: f32, full_scale: u16) -> u16 {
    if temp_k >= warm_ref_k {
        return 0;
    }
    if temp_k <= cold_ref_k {
        return full_scale;
    }
    let fraction = (warm_ref_k - temp_k) / (warm_ref_k - cold_ref_k);
    let level = (full_scale as f32 * fraction).round();
    level.clamp(0.0, full_scale as f32) as u16
}

/// Move `current` toward `target` by at most `max_step`.
#[inline]
pub fn ramp_toward(current: u16, target: u16, max_step: u16) -> u16 {
    if current < target {
        current.saturating_add(max_step).min(target)
    } else {
        current.saturating_sub(max_step).max(target)
    }
}

/// Reduce `level` by the cumulative backoff offset, floored at zero.
#[inline]
pub fn apply_backoff(level: u16, cumulative_offset: u16) -> u16 {
    level.saturating_sub(cumulative_offset)
}

/// Cooling-rate guard.
///
/// Returns `level` unchanged; the rate is accepted so a limiting policy can
/// be slotted in without touching callers.
#[inline]
pub fn apply_rate_guard(level: u16, rate_k_per_min: f32, max_rate_k_per_min: f32) -> u16 {
    if rate_k_per_min > max_rate_k_per_min {
        trace!(rate_k_per_min, max_rate_k_per_min, "cooling rate above guard threshold");
    }
    level
}

// ─── Planner ────────────────────────────────────────────────────────

/// Cooldown target planner bound to one configuration.
#[derive(Debug, Clone)]
pub struct ActuatorPlanner {
    config: PlannerConfig,
}

impl ActuatorPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Planned cooldown level before backoff.
    pub fn cooldown_level(&self, temp_k: f32, rate_k_per_min: f32) -> u16 {
        let level = temperature_to_level(
            temp_k,
            self.config.warm_ref_k,
            self.config.cold_ref_k,
            self.config.full_scale,
        );
        apply_rate_guard(level, rate_k_per_min, self.config.max_cooldown_rate_k_per_min)
    }

    /// Planned cooldown level with backoff applied to nonzero targets.
    pub fn cooldown_target(&self, temp_k: f32, rate_k_per_min: f32, backoff_offset: u16) -> u16 {
        let level = self.cooldown_level(temp_k, rate_k_per_min);
        if level > 0 && backoff_offset > 0 {
            apply_backoff(level, backoff_offset)
        } else {
            level
        }
    }

    /// Cooldown progress along this planner's ramp [%].
    #[inline]
    pub fn cooldown_percent(&self, temp_k: f32) -> f32 {
        conversions::cooldown_percent(temp_k, self.config.warm_ref_k, self.config.cold_ref_k)
    }
}

impl Default for ActuatorPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}
