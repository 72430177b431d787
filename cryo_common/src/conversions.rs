//! Pure temperature and formatting helpers for status reporting.

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f32 = 273.15;

#[inline]
pub fn kelvin_to_celsius(temp_k: f32) -> f32 {
    temp_k - KELVIN_OFFSET
}

/// Cooldown progress in percent: 0 % at `warm_ref_k`, 100 % at `cold_ref_k`.
///
/// Clamped to `[0, 100]`. Returns 0 when the references coincide.
pub fn cooldown_percent(temp_k: f32, warm_ref_k: f32, cold_ref_k: f32) -> f32 {
    let span = warm_ref_k - cold_ref_k;
    if span <= 0.0 {
        return 0.0;
    }
    ((warm_ref_k - temp_k) / span * 100.0).clamp(0.0, 100.0)
}

/// Format a millisecond duration as `HH:MM:SS`.
pub fn format_hms(duration_ms: u64) -> String {
    let total_s = duration_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        total_s / 3600,
        (total_s / 60) % 60,
        total_s % 60
    )
}
