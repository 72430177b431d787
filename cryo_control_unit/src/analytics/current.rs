//! Overstroke detector.
//!
//! Tracks an exponential moving average of the compressor drive current and
//! flags transient spikes above it. The flag is edge-triggered: once set it
//! stays set until [`CurrentAnomalyDetector::clear`] acknowledges it, and no
//! new event is raised while it is pending.

use cryo_common::control_unit::config::DetectorConfig;
use tracing::debug;

/// EMA baseline tracker with debounced spike detection.
#[derive(Debug, Clone)]
pub struct CurrentAnomalyDetector {
    alpha: f32,
    prime_readings: u16,
    threshold_a: f32,
    debounce_ms: u64,

    ema_value: f32,
    primed_count: u16,
    overstroke_flagged: bool,
    last_event_ms: u64,
    last_current_a: f32,
}

impl CurrentAnomalyDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            alpha: config.ema_alpha,
            prime_readings: config.prime_readings,
            threshold_a: config.current_threshold_a,
            debounce_ms: config.debounce_ms,
            ema_value: 0.0,
            primed_count: 0,
            overstroke_flagged: false,
            last_event_ms: 0,
            last_current_a: 0.0,
        }
    }

    /// Feed one current reading. Returns `true` only when a new event is
    /// flagged by this call.
    pub fn sample(&mut self, current_a: f32, now_ms: u64) -> bool {
        self.last_current_a = current_a;

        if self.primed_count < self.prime_readings {
            self.ema_value = current_a;
            self.primed_count += 1;
            return false;
        }

        self.ema_value += self.alpha * (current_a - self.ema_value);

        let delta = current_a - self.ema_value;
        if delta > self.threshold_a
            && !self.overstroke_flagged
            && now_ms.saturating_sub(self.last_event_ms) >= self.debounce_ms
        {
            self.overstroke_flagged = true;
            self.last_event_ms = now_ms;
            debug!(
                current_a,
                baseline_a = self.ema_value,
                now_ms,
                "overstroke flagged"
            );
            return true;
        }
        false
    }

    /// Acknowledge a pending event.
    #[inline]
    pub fn clear(&mut self) {
        self.overstroke_flagged = false;
    }

    #[inline]
    pub fn has_flag(&self) -> bool {
        self.overstroke_flagged
    }

    /// Current baseline [A].
    #[inline]
    pub fn baseline(&self) -> f32 {
        self.ema_value
    }

    /// Whether priming has completed and spikes can be detected.
    #[inline]
    pub fn is_primed(&self) -> bool {
        self.primed_count >= self.prime_readings
    }

    #[inline]
    pub fn last_current(&self) -> f32 {
        self.last_current_a
    }

    /// Forget the baseline and re-prime from the next reading.
    pub fn reset(&mut self) {
        self.ema_value = 0.0;
        self.primed_count = 0;
        self.overstroke_flagged = false;
        self.last_event_ms = 0;
        self.last_current_a = 0.0;
    }
}
