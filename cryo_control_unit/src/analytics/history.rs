//! Fixed-capacity temperature history.
//!
//! Samples live in a `heapless::Deque` sized for [`MAX_HISTORY_CAPACITY`];
//! the logical capacity chosen at construction may be smaller. When the
//! logical capacity is reached the oldest sample is dropped.

use cryo_common::consts::{MAX_HISTORY_CAPACITY, TEMP_HISTORY_SIZE};
use heapless::Deque;
use serde::Serialize;

/// One temperature reading with its monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureSample {
    pub timestamp_ms: u64,
    pub temperature_k: f32,
}

/// Ring of the most recent temperature samples, oldest first.
#[derive(Debug, Clone)]
pub struct TemperatureHistory {
    samples: Deque<TemperatureSample, MAX_HISTORY_CAPACITY>,
    capacity: usize,
}

impl TemperatureHistory {
    /// Create an empty history.
    ///
    /// `capacity` is clamped into `[2, MAX_HISTORY_CAPACITY]`; config
    /// validation rejects values outside that range before they get here.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Deque::new(),
            capacity: capacity.clamp(2, MAX_HISTORY_CAPACITY),
        }
    }

    /// Append a sample, overwriting the oldest one when full.
    pub fn push_sample(&mut self, timestamp_ms: u64, temperature_k: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        // Cannot fail: len < capacity <= MAX_HISTORY_CAPACITY.
        let _ = self.samples.push_back(TemperatureSample {
            timestamp_ms,
            temperature_k,
        });
    }

    /// Cooling rate over the whole retained window [K/min].
    ///
    /// Positive while cooling. Zero with fewer than two samples or when
    /// oldest and newest share a timestamp.
    pub fn cooling_rate_k_per_min(&self) -> f32 {
        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        if self.samples.len() < 2 {
            return 0.0;
        }
        let elapsed_ms = newest.timestamp_ms.saturating_sub(oldest.timestamp_ms);
        if elapsed_ms == 0 {
            return 0.0;
        }
        let elapsed_min = elapsed_ms as f32 / 60_000.0;
        (oldest.temperature_k - newest.temperature_k) / elapsed_min
    }

    /// Whether the temperature failed to drop by `min_drop_k` within the
    /// trailing `window_ms`.
    ///
    /// The reference is the oldest retained sample no older than `window_ms`
    /// relative to the newest one.
    pub fn is_stalled(&self, window_ms: u64, min_drop_k: f32) -> bool {
        if self.samples.len() < 2 {
            return false;
        }
        let Some(newest) = self.samples.back() else {
            return false;
        };
        let reference = self
            .samples
            .iter()
            .find(|s| newest.timestamp_ms.saturating_sub(s.timestamp_ms) <= window_ms)
            .unwrap_or(newest);

        (reference.temperature_k - newest.temperature_k) < min_drop_k
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Logical capacity chosen at construction.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn newest(&self) -> Option<&TemperatureSample> {
        self.samples.back()
    }

    #[inline]
    pub fn oldest(&self) -> Option<&TemperatureSample> {
        self.samples.front()
    }

    /// Sample at logical index `index` (0 = oldest).
    pub fn sample_at(&self, index: usize) -> Option<&TemperatureSample> {
        self.samples.iter().nth(index)
    }

    /// Iterate oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &TemperatureSample> {
        self.samples.iter()
    }

    /// Drop every sample; capacity is unchanged.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for TemperatureHistory {
    fn default() -> Self {
        Self::new(TEMP_HISTORY_SIZE)
    }
}
