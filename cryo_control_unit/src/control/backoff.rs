//! Cumulative overstroke backoff.

use serde::Serialize;

/// Backoff accumulated since the last `start`.
///
/// `cumulative_offset == min(event_count * step, full_scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BackoffState {
    pub event_count: u16,
    pub cumulative_offset: u16,
}

impl BackoffState {
    pub const fn new() -> Self {
        Self {
            event_count: 0,
            cumulative_offset: 0,
        }
    }

    /// Record one overstroke event. Returns the new event count.
    pub fn record_event(&mut self, step: u16, full_scale: u16) -> u16 {
        self.event_count = self.event_count.saturating_add(1);
        self.cumulative_offset = self.cumulative_offset.saturating_add(step).min(full_scale);
        self.event_count
    }

    /// Whether the event ceiling has been reached.
    #[inline]
    pub const fn is_exhausted(&self, max_count: u16) -> bool {
        self.event_count >= max_count
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
