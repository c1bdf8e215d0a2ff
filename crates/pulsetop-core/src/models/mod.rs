//! Snapshot data models handed to the renderer.
//!
//! All types are plain data: cloned out of the collector, never mutated after
//! return, and serializable so a renderer in another process can consume them.

mod process;

pub use process::{Process, ProcessList, SortBy};

use serde::{Deserialize, Serialize};

/// One complete, internally consistent view of the system.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct SystemSnapshot {
    /// Wall-clock time the snapshot was assembled (seconds since epoch).
    pub timestamp: i64,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub network: NetworkStats,
    /// One entry per block-device backed mount.
    pub disks: Vec<DiskStats>,
    pub battery: BatteryStats,
    /// Seconds since boot.
    /// Source: `/proc/uptime` field 1, else `now - btime`
    pub uptime_secs: u64,
}

/// CPU utilization and identity.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CpuStats {
    /// Overall busy percentage since the previous sample.
    /// Source: `cpu` line of `/proc/stat`
    pub usage: f64,

    /// Per-core busy percentage, ordered by core index.
    /// Source: `cpuN` lines of `/proc/stat`
    pub cores: Vec<f64>,

    /// Current clock of the first core (MHz), 0 when unknown.
    /// Source: `/proc/cpuinfo` "cpu MHz"
    pub frequency: f64,

    /// Package temperature (°C). `None` when no sensor is readable.
    /// Source: `/sys/class/thermal` or `/sys/class/hwmon`
    pub temperature: Option<f32>,

    /// Source: `/proc/cpuinfo` "model name"
    pub model: String,
}

impl Default for CpuStats {
    fn default() -> Self {
        Self {
            usage: 0.0,
            cores: Vec::new(),
            frequency: 0.0,
            temperature: None,
            model: "Unknown CPU".to_string(),
        }
    }
}

/// Memory usage in bytes.
///
/// Source: `/proc/meminfo`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct MemoryStats {
    /// Source: MemTotal
    pub total: u64,
    /// `total - available`
    pub used: u64,
    /// Source: MemFree
    pub free: u64,
    /// Source: MemAvailable, or MemFree on kernels without it
    pub available: u64,
    /// Source: SwapTotal
    pub swap_total: u64,
    /// `SwapTotal - SwapFree`
    pub swap_used: u64,
    /// `used / total * 100`
    pub usage_percent: f64,
}

/// A non-loopback network interface.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct NetworkInterface {
    /// Source: `/proc/net/dev` interface column
    pub name: String,
    /// Cumulative bytes received.
    pub rx_bytes: u64,
    /// Cumulative bytes transmitted.
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    /// Link state (`up`, `down`, ...) or `unknown`.
    /// Source: `/sys/class/net/<if>/operstate`
    pub status: String,
    /// Link speed (`"1000 Mb/s"`) or `unknown`.
    /// Source: `/sys/class/net/<if>/speed`
    pub speed: String,
    /// Receive throughput (bytes/s) since the previous snapshot.
    pub rx_rate: f64,
    /// Transmit throughput (bytes/s) since the previous snapshot.
    pub tx_rate: f64,
}

/// Network interfaces plus totals.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct NetworkStats {
    pub interfaces: Vec<NetworkInterface>,
    /// Sum of `rx_bytes` across interfaces.
    pub total_rx: u64,
    /// Sum of `tx_bytes` across interfaces.
    pub total_tx: u64,
    /// Sum of `rx_rate` across interfaces.
    pub rx_rate: f64,
    /// Sum of `tx_rate` across interfaces.
    pub tx_rate: f64,
}

/// Capacity and I/O of one mounted block device.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct DiskStats {
    /// Source: `/proc/mounts` field 1
    pub device: String,
    /// Source: `/proc/mounts` field 2
    pub mountpoint: String,
    /// Source: `/proc/mounts` field 3
    pub filesystem: String,
    /// Source: `statvfs` f_blocks * f_frsize
    pub total: u64,
    /// `total - free`
    pub used: u64,
    /// Source: `statvfs` f_bavail * f_frsize
    pub free: u64,
    pub usage_percent: f64,
    /// Source: `/proc/diskstats` sectors read * 512
    pub read_bytes: u64,
    /// Source: `/proc/diskstats` sectors written * 512
    pub write_bytes: u64,
    /// Source: `/proc/diskstats` reads completed
    pub read_ops: u64,
    /// Source: `/proc/diskstats` writes completed
    pub write_ops: u64,
    /// Read throughput (bytes/s) since the previous snapshot.
    pub read_rate: f64,
    /// Write throughput (bytes/s) since the previous snapshot.
    pub write_rate: f64,
}

/// Battery state.
///
/// Source: `/sys/class/power_supply/BAT*`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct BatteryStats {
    /// Charge level (percent).
    pub level: u8,
    /// Supply status, `Unknown` when unreadable, `Not Available` without a battery.
    pub status: String,
    /// `"3h 12m"` or `N/A`.
    pub time_left: String,
    pub is_charging: bool,
    /// Full-charge capacity relative to design (percent), 100 when unknown.
    pub health: u8,
}

impl BatteryStats {
    /// Placeholder reported on systems without a battery.
    pub fn not_available() -> Self {
        Self {
            level: 100,
            status: "Not Available".to_string(),
            time_left: "N/A".to_string(),
            is_charging: false,
            health: 100,
        }
    }

    /// Returns true when a battery was detected.
    pub fn is_present(&self) -> bool {
        self.status != "Not Available"
    }
}

impl Default for BatteryStats {
    fn default() -> Self {
        Self::not_available()
    }
}
