//! Derived-metric calculators.
//!
//! Pure functions turning one or two raw samples into a percentage or a
//! per-second rate. Nothing here reads files or keeps state; callers pass the
//! previous sample explicitly. Logical inconsistencies (a counter that went
//! backwards, a zero denominator) produce 0 or `None`, never a negative or
//! out-of-range value.

use std::time::Duration;

use crate::collector::procfs::CpuTimes;
use crate::collector::sysfs::BatteryRaw;
use crate::util::{clamp_percent, percent_of};

/// Clock ticks per second (USER_HZ). Standard value for Linux.
pub const CLK_TCK: u64 = 100;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute u64 delta, returning `None` on counter regression.
pub fn du64(curr: u64, prev: u64) -> Option<u64> {
    (curr >= prev).then(|| curr - prev)
}

/// Per-second rate of a monotonic counter.
///
/// Returns `None` on counter regression (interface reset, device re-plug) or
/// when no time has elapsed.
pub fn counter_rate(previous: u64, current: u64, elapsed_secs: f64) -> Option<f64> {
    if elapsed_secs <= 0.0 {
        return None;
    }
    du64(current, previous).map(|d| d as f64 / elapsed_secs)
}

// ---------------------------------------------------------------------------
// Percentages
// ---------------------------------------------------------------------------

/// CPU busy percentage between two samples of the same counter.
///
/// Returns 0 unless `current.total > previous.total`, and 0 when the idle
/// delta is inconsistent with the total delta.
pub fn usage_percent(previous: &CpuTimes, current: &CpuTimes) -> f64 {
    if current.total <= previous.total {
        return 0.0;
    }
    let total_diff = current.total - previous.total;
    let Some(idle_diff) = du64(current.idle, previous.idle) else {
        return 0.0;
    };
    if idle_diff > total_diff {
        return 0.0;
    }

    clamp_percent(percent_of(
        (total_diff - idle_diff) as f64,
        total_diff as f64,
    ))
}

/// Used memory as a percentage of total. 0 when total is unknown.
pub fn memory_usage_percent(used: u64, total: u64) -> f64 {
    clamp_percent(percent_of(used as f64, total as f64))
}

/// Used space as a percentage of filesystem capacity. 0 for empty filesystems.
pub fn disk_usage_percent(used: u64, total: u64) -> f64 {
    clamp_percent(percent_of(used as f64, total as f64))
}

/// Battery wear: full-charge capacity relative to design capacity, capped at 100.
///
/// `None` when either value is unknown (reported as zero).
pub fn battery_health_percent(full: u64, design: u64) -> Option<f64> {
    if full == 0 || design == 0 {
        return None;
    }
    Some(percent_of(full as f64, design as f64).min(100.0))
}

/// CPU consumed by a process since it started, as a percentage of one core.
///
/// # Arguments
/// * `cpu_ticks` - utime + stime from `/proc/[pid]/stat`
/// * `start_ticks` - starttime from `/proc/[pid]/stat` (ticks after boot)
/// * `uptime_secs` - seconds since boot from `/proc/uptime`
pub fn process_cpu_percent(cpu_ticks: u64, start_ticks: u64, uptime_secs: f64) -> f64 {
    let runtime = uptime_secs - start_ticks as f64 / CLK_TCK as f64;
    if runtime <= 0.0 {
        return 0.0;
    }
    let cpu_secs = cpu_ticks as f64 / CLK_TCK as f64;
    clamp_percent(cpu_secs / runtime * 100.0)
}

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

/// Estimated time until empty (discharging) or full (charging).
///
/// Needs the current draw and stored energy; returns `None` when the supply
/// reports no draw.
pub fn battery_time_remaining(raw: &BatteryRaw, charging: bool) -> Option<Duration> {
    let power = raw.power_now.filter(|&p| p > 0)? as f64;
    let now = raw.energy_now? as f64;

    let hours = if charging {
        let full = raw.energy_full? as f64;
        (full - now).max(0.0) / power
    } else {
        now / power
    };

    hours
        .is_finite()
        .then(|| Duration::from_secs_f64(hours * 3600.0))
}

/// Rough estimate from charge level alone, used when the supply does not
/// report its draw: ten percent per hour.
pub fn battery_time_from_level(level: u8) -> Duration {
    let hours = u64::from(level / 10);
    let mins = u64::from(level % 10) * 6;
    Duration::from_secs(hours * 3600 + mins * 60)
}
