// src/waveform/ticks.rs

/// Candidate tick spacings in seconds.
pub const NICE_STEPS: [f64; 16] = [
    0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0, 600.0,
];

pub const DEFAULT_TARGET_TICKS: f64 = 8.0;

/// Smallest nice step that keeps `duration / step` at or below `target`.
/// Falls back to the largest step for very long durations.
pub fn choose_tick_step(duration_secs: f64, target: f64) -> f64 {
    if !(duration_secs.is_finite() && duration_secs > 0.0) || target <= 0.0 {
        return NICE_STEPS[0];
    }
    NICE_STEPS
        .iter()
        .copied()
        .find(|step| duration_secs / step <= target)
        .unwrap_or(NICE_STEPS[NICE_STEPS.len() - 1])
}

/// Tick times from 0 up to and including `duration_secs`.
pub fn tick_times(duration_secs: f64, step: f64) -> Vec<f64> {
    if !(duration_secs.is_finite() && duration_secs > 0.0 && step > 0.0) {
        return Vec::new();
    }
    // Integer stepping avoids accumulated drift.
    let count = (duration_secs / step + 1e-9).floor() as u64;
    (0..=count).map(|i| i as f64 * step).collect()
}

/// `m:ss.cc`, or `h:mm:ss` once past an hour.
pub fn format_time(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let total_cs = (secs * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total_s = total_cs / 100;
    let s = total_s % 60;
    let m = (total_s / 60) % 60;
    let h = total_s / 3600;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}.{cs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_choice_bounds_tick_count() {
        assert_eq!(choose_tick_step(1.0, 8.0), 0.2);
        assert_eq!(choose_tick_step(0.05, 8.0), 0.01);
        assert_eq!(choose_tick_step(60.0, 8.0), 10.0);
        assert_eq!(choose_tick_step(3600.0, 8.0), 600.0);
        assert_eq!(choose_tick_step(100_000.0, 8.0), 600.0);
        assert_eq!(choose_tick_step(0.0, 8.0), 0.01);
    }

    #[test]
    fn ticks_include_endpoint_when_aligned() {
        let t = tick_times(1.0, 0.2);
        assert_eq!(t.len(), 6);
        assert!((t[5] - 1.0).abs() < 1e-12);
        assert!(tick_times(0.0, 0.2).is_empty());
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0.0), "0:00.00");
        assert_eq!(format_time(61.256), "1:01.26");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(f64::NAN), "0:00.00");
    }
}
