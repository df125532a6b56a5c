//! Time formatting for chart labels and tooltips.

use std::time::Duration;

/// Lap time as `MM:SS.mmm`. Non-positive or non-finite input gives `N/A`.
///
/// # Examples
///
/// ```
/// use f1_data::format::format_lap_time;
///
/// assert_eq!(format_lap_time(83.456), "01:23.456");
/// assert_eq!(format_lap_time(0.0), "N/A");
/// ```
pub fn format_lap_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "N/A".to_string();
    }
    let total_millis = (seconds * 1000.0).round() as u64;
    let minutes = total_millis / 60_000;
    let secs = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{minutes:02}:{secs:02}.{millis:03}")
}

/// Lap time from an optional duration.
pub fn format_lap_duration(lap_time: Option<Duration>) -> String {
    lap_time
        .map(|d| format_lap_time(d.as_secs_f64()))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Elapsed session time as `HH:MM:SS`.
pub fn format_hms(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Axis tick label as `MM:SS`, truncating fractions.
pub fn format_mmss(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}
