//! Shared formatting helpers.
//!
//! Pure string formatting for values the snapshot carries as display text
//! (process runtime, battery time left) and for log summaries.

use std::time::Duration;

/// Format byte count as human-readable size: `"1.5G"`, `"100.3M"`, `"50.0K"`, `"512B"`.
pub fn format_bytes(bytes: u64) -> String {
    let f = bytes as f64;
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}G", f / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}M", f / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}K", f / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

/// Format a bytes/s rate: `"1.5M/s"`. Negative or non-finite rates print as `"-"`.
pub fn format_bytes_rate(rate: f64) -> String {
    if !rate.is_finite() || rate < 0.0 {
        return "-".to_string();
    }
    format!("{}/s", format_bytes(rate as u64))
}

/// Format elapsed seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_runtime(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Format a remaining-time estimate as `"3h 12m"`.
pub fn format_time_left(d: Duration) -> String {
    let mins = d.as_secs() / 60;
    format!("{}h {}m", mins / 60, mins % 60)
}
