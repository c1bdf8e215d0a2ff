//! Stats collector: fans out one worker per metric family and assembles a
//! [`SystemSnapshot`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::collector::cache::{CpuUsage, MetricFamily, SampleCache, counter_rates};
use crate::collector::procfs::process::{ProcessCollector, ProcessContext};
use crate::collector::procfs::{CpuAccounting, SystemReader};
use crate::collector::sysfs::SysfsReader;
use crate::collector::traits::{Clock, FileSystem, SystemClock};
use crate::fmt::format_time_left;
use crate::models::{
    BatteryStats, CpuStats, DiskStats, MemoryStats, NetworkInterface, NetworkStats, ProcessList,
    SortBy, SystemSnapshot,
};
use crate::rates::{
    battery_health_percent, battery_time_from_level, battery_time_remaining, disk_usage_percent,
    memory_usage_percent, usage_percent,
};

/// How long a snapshot waits for all family workers.
pub const FAMILY_TIMEOUT: Duration = Duration::from_secs(3);

/// Minimum spacing between two raw CPU samples for a usage delta.
pub const MIN_USAGE_INTERVAL: Duration = Duration::from_millis(100);

const UNKNOWN_CPU: &str = "Unknown CPU";
const UNKNOWN: &str = "unknown";

/// Metric families collected in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Cpu,
    Memory,
    Network,
    Disk,
    Battery,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Cpu,
        Family::Memory,
        Family::Network,
        Family::Disk,
        Family::Battery,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::Cpu => "cpu",
            Family::Memory => "memory",
            Family::Network => "network",
            Family::Disk => "disk",
            Family::Battery => "battery",
        }
    }
}

enum FamilyResult {
    Cpu(CpuStats),
    Memory(MemoryStats),
    Network(NetworkStats),
    Disk(Vec<DiskStats>),
    Battery(BatteryStats),
}

impl FamilyResult {
    fn family(&self) -> Family {
        match self {
            FamilyResult::Cpu(_) => Family::Cpu,
            FamilyResult::Memory(_) => Family::Memory,
            FamilyResult::Network(_) => Family::Network,
            FamilyResult::Disk(_) => Family::Disk,
            FamilyResult::Battery(_) => Family::Battery,
        }
    }
}

/// Timing information for the last snapshot.
///
/// A family that missed the deadline has no entry.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total snapshot collection time.
    pub total: Duration,
    pub cpu: Option<Duration>,
    pub memory: Option<Duration>,
    pub network: Option<Duration>,
    pub disk: Option<Duration>,
    pub battery: Option<Duration>,
}

impl CollectorTiming {
    fn record(&mut self, family: Family, elapsed: Duration) {
        let slot = match family {
            Family::Cpu => &mut self.cpu,
            Family::Memory => &mut self.memory,
            Family::Network => &mut self.network,
            Family::Disk => &mut self.disk,
            Family::Battery => &mut self.battery,
        };
        *slot = Some(elapsed);
    }

    /// Families that did not report before the deadline.
    pub fn timed_out(&self) -> Vec<Family> {
        Family::ALL
            .into_iter()
            .filter(|f| {
                match f {
                    Family::Cpu => self.cpu,
                    Family::Memory => self.memory,
                    Family::Network => self.network,
                    Family::Disk => self.disk,
                    Family::Battery => self.battery,
                }
                .is_none()
            })
            .collect()
    }
}

/// Clears a family's in-flight flag when its worker exits.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State shared with the family workers.
struct Shared<F: FileSystem> {
    system: SystemReader<F>,
    sysfs: SysfsReader<F>,
    cache: SampleCache,
    clock: Arc<dyn Clock>,
    /// Set while a worker for the family is running, at most one per family.
    in_flight: [AtomicBool; Family::ALL.len()],
}

impl<F: FileSystem> Shared<F> {
    /// Claims the family for a new worker. False if one is still running.
    fn try_claim(&self, family: Family) -> bool {
        !self.in_flight[family.index()].swap(true, Ordering::AcqRel)
    }

    fn release(&self, family: Family) {
        self.in_flight[family.index()].store(false, Ordering::Release);
    }

    fn collect(&self, family: Family) -> FamilyResult {
        match family {
            Family::Cpu => FamilyResult::Cpu(self.collect_cpu()),
            Family::Memory => FamilyResult::Memory(self.collect_memory()),
            Family::Network => FamilyResult::Network(self.collect_network()),
            Family::Disk => FamilyResult::Disk(self.collect_disks()),
            Family::Battery => FamilyResult::Battery(self.collect_battery()),
        }
    }

    fn collect_cpu(&self) -> CpuStats {
        let (model, frequency) = self.cpu_identity();
        let temperature = self.cpu_temperature();
        let usage = self.cpu_usage();

        CpuStats {
            usage: usage.overall,
            cores: usage.cores,
            frequency,
            temperature,
            model,
        }
    }

    fn cpu_identity(&self) -> (String, f64) {
        let cache = &self.cache;
        let model_valid = cache.is_valid(MetricFamily::CpuModel);
        if !model_valid || !cache.is_valid(MetricFamily::CpuFrequency) {
            if let Some(identity) = self.system.read_cpu_identity() {
                if !model_valid {
                    cache.set_model(identity.model.unwrap_or_else(|| UNKNOWN_CPU.to_string()));
                }
                cache.set_frequency(identity.mhz.unwrap_or(0.0));
            }
        }

        (
            cache.model().unwrap_or_else(|| UNKNOWN_CPU.to_string()),
            cache.frequency().unwrap_or(0.0),
        )
    }

    fn cpu_temperature(&self) -> Option<f32> {
        if self.cache.is_valid(MetricFamily::CpuTemperature) {
            return self.cache.temperature();
        }
        let celsius = self.sysfs.read_temperature();
        self.cache.set_temperature(celsius);
        celsius
    }

    fn cpu_usage(&self) -> CpuUsage {
        let cache = &self.cache;
        if cache.is_valid(MetricFamily::CpuUsage) {
            return cache.usage().unwrap_or_default();
        }

        let Some(current) = self.system.read_cpu_accounting() else {
            return CpuUsage::default();
        };

        let Some(previous) = cache.previous_sample() else {
            // First sample only seeds the baseline
            let usage = CpuUsage::zeroed(core_indices(&current).len());
            cache.set_previous_sample(current);
            return usage;
        };

        if cache
            .previous_sample_age()
            .is_some_and(|age| age < MIN_USAGE_INTERVAL)
        {
            return cache
                .usage()
                .unwrap_or_else(|| CpuUsage::zeroed(core_indices(&current).len()));
        }

        let usage = derive_usage(&previous, &current);
        cache.set_previous_sample(current);
        cache.set_usage(usage.clone());
        usage
    }

    fn collect_memory(&self) -> MemoryStats {
        let Some(info) = self.system.read_memory_info() else {
            return MemoryStats::default();
        };

        let available = info.mem_available.unwrap_or(info.mem_free);
        let used = info.mem_total.saturating_sub(available);

        MemoryStats {
            total: info.mem_total,
            used,
            free: info.mem_free,
            available,
            swap_total: info.swap_total,
            swap_used: info.swap_total.saturating_sub(info.swap_free),
            usage_percent: memory_usage_percent(used, info.mem_total),
        }
    }

    fn collect_network(&self) -> NetworkStats {
        let Some(counters) = self.system.read_network_interfaces() else {
            return NetworkStats::default();
        };

        let current: HashMap<String, (u64, u64)> = counters
            .iter()
            .map(|c| (c.name.clone(), (c.rx_bytes, c.tx_bytes)))
            .collect();
        let now = self.clock.now();
        let rates = self
            .cache
            .swap_network_sample(current.clone())
            .map(|previous| counter_rates(&previous, &current, now))
            .unwrap_or_default();

        let mut stats = NetworkStats::default();
        for c in counters {
            let (rx_rate, tx_rate) = rates.get(&c.name).copied().unwrap_or((0.0, 0.0));

            stats.total_rx = stats.total_rx.saturating_add(c.rx_bytes);
            stats.total_tx = stats.total_tx.saturating_add(c.tx_bytes);
            stats.rx_rate += rx_rate;
            stats.tx_rate += tx_rate;

            stats.interfaces.push(NetworkInterface {
                status: self
                    .sysfs
                    .read_interface_status(&c.name)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                speed: self
                    .sysfs
                    .read_interface_speed(&c.name)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                name: c.name,
                rx_bytes: c.rx_bytes,
                tx_bytes: c.tx_bytes,
                rx_packets: c.rx_packets,
                tx_packets: c.tx_packets,
                rx_rate,
                tx_rate,
            });
        }

        stats
    }

    fn collect_disks(&self) -> Vec<DiskStats> {
        let Some(mounts) = self.system.read_mounts() else {
            return Vec::new();
        };

        let mut disks = Vec::with_capacity(mounts.len());
        for mount in mounts {
            // Mounts that cannot be queried are not shown
            let Some(capacity) = self.system.stat_filesystem(&mount.mountpoint) else {
                continue;
            };
            let io = self.system.read_disk_io(&mount.device).unwrap_or_default();
            let used = capacity.total.saturating_sub(capacity.free);

            disks.push(DiskStats {
                device: mount.device,
                mountpoint: mount.mountpoint,
                filesystem: mount.fstype,
                total: capacity.total,
                used,
                free: capacity.free,
                usage_percent: disk_usage_percent(used, capacity.total),
                read_bytes: io.read_bytes,
                write_bytes: io.write_bytes,
                read_ops: io.reads,
                write_ops: io.writes,
                read_rate: 0.0,
                write_rate: 0.0,
            });
        }

        let current: HashMap<String, (u64, u64)> = disks
            .iter()
            .map(|d| (d.mountpoint.clone(), (d.read_bytes, d.write_bytes)))
            .collect();
        let now = self.clock.now();
        if let Some(previous) = self.cache.swap_disk_sample(current.clone()) {
            let rates = counter_rates(&previous, &current, now);
            for disk in &mut disks {
                if let Some(&(read_rate, write_rate)) = rates.get(&disk.mountpoint) {
                    disk.read_rate = read_rate;
                    disk.write_rate = write_rate;
                }
            }
        }

        disks
    }

    fn collect_battery(&self) -> BatteryStats {
        let Some(raw) = self.sysfs.read_battery() else {
            return BatteryStats::not_available();
        };

        let level = raw.capacity.unwrap_or(0);
        let status = raw.status.clone().unwrap_or_else(|| "Unknown".to_string());
        let is_charging = status == "Charging";

        let time_left = if is_charging {
            battery_time_remaining(&raw, true)
        } else if level > 0 {
            battery_time_remaining(&raw, false).or(Some(battery_time_from_level(level)))
        } else {
            None
        };

        let health = match (raw.energy_full, raw.energy_full_design) {
            (Some(full), Some(design)) => battery_health_percent(full, design),
            _ => None,
        };

        BatteryStats {
            level,
            status,
            time_left: time_left
                .map(format_time_left)
                .unwrap_or_else(|| "N/A".to_string()),
            is_charging,
            // Truncated, not rounded
            health: health.map(|h| h as u8).unwrap_or(100),
        }
    }

    fn uptime_secs(&self) -> u64 {
        if let Some(uptime) = self.system.read_uptime() {
            return uptime as u64;
        }
        self.system
            .read_boot_time()
            .map(|boot| (self.clock.unix_time().max(0) as u64).saturating_sub(boot))
            .unwrap_or(0)
    }
}

/// Core indices (`N` of `cpuN`) present in a sample, ascending.
fn core_indices(sample: &CpuAccounting) -> Vec<u32> {
    let mut indices: Vec<u32> = sample
        .keys()
        .filter_map(|k| k.strip_prefix("cpu")?.parse().ok())
        .collect();
    indices.sort_unstable();
    indices
}

/// Overall and per-core usage between two samples.
///
/// A core contributes only if it appears in both samples.
fn derive_usage(previous: &CpuAccounting, current: &CpuAccounting) -> CpuUsage {
    let overall = match (previous.get("cpu"), current.get("cpu")) {
        (Some(prev), Some(curr)) => usage_percent(prev, curr),
        _ => 0.0,
    };

    let cores = core_indices(current)
        .into_iter()
        .filter_map(|i| {
            let key = format!("cpu{}", i);
            Some(usage_percent(previous.get(&key)?, current.get(&key)?))
        })
        .collect();

    CpuUsage { overall, cores }
}

/// Collects system snapshots, caching expensive values between calls.
///
/// Cheap to share: `snapshot()` and `processes()` take `&self`.
pub struct StatsCollector<F: FileSystem + Clone + 'static> {
    shared: Arc<Shared<F>>,
    processes: Mutex<ProcessCollector<F>>,
    last_good: RwLock<SystemSnapshot>,
    last_timing: RwLock<Option<CollectorTiming>>,
    timeout: Duration,
}

impl<F: FileSystem + Clone + 'static> StatsCollector<F> {
    /// Creates a new collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `sys_path` - Base path to sysfs (usually "/sys")
    pub fn new(fs: F, proc_path: impl Into<String>, sys_path: impl Into<String>) -> Self {
        Self::with_clock(fs, proc_path, sys_path, Arc::new(SystemClock))
    }

    /// Creates a collector reading time from `clock`.
    pub fn with_clock(
        fs: F,
        proc_path: impl Into<String>,
        sys_path: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let proc_path = proc_path.into();
        Self {
            shared: Arc::new(Shared {
                system: SystemReader::new(fs.clone(), proc_path.clone()),
                sysfs: SysfsReader::new(fs.clone(), sys_path),
                cache: SampleCache::new(clock.clone()),
                clock,
                in_flight: Default::default(),
            }),
            processes: Mutex::new(ProcessCollector::new(fs, proc_path)),
            last_good: RwLock::new(SystemSnapshot::default()),
            last_timing: RwLock::new(None),
            timeout: FAMILY_TIMEOUT,
        }
    }

    /// Overrides how long a snapshot waits for family workers.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns timing information from the last snapshot.
    pub fn last_timing(&self) -> Option<CollectorTiming> {
        self.last_timing
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Drops all cached values and previous samples.
    ///
    /// The next snapshot re-reads every source and reports zero CPU usage.
    pub fn clear_cache(&self) {
        self.shared.cache.clear();
    }

    /// Collects one snapshot of every metric family.
    ///
    /// Never fails: unavailable sources degrade to placeholders, and a family
    /// that misses the deadline keeps its value from the previous snapshot.
    /// A family whose worker from an earlier snapshot is still blocked is not
    /// spawned again until that worker returns.
    pub fn snapshot(&self) -> SystemSnapshot {
        let total_start = Instant::now();
        let deadline = total_start + self.timeout;
        let (tx, rx) = mpsc::channel();

        let mut expected = 0;
        for family in Family::ALL {
            if !self.shared.try_claim(family) {
                debug!(family = family.name(), "worker still running, keeping previous value");
                continue;
            }

            let shared = Arc::clone(&self.shared);
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("pulsetop-{}", family.name()))
                .spawn(move || {
                    let _in_flight = InFlight(&shared.in_flight[family.index()]);
                    let start = Instant::now();
                    let result = shared.collect(family);
                    // Receiver is gone if the snapshot already timed out
                    let _ = tx.send((result, start.elapsed()));
                });
            match spawned {
                Ok(_) => expected += 1,
                Err(e) => {
                    self.shared.release(family);
                    warn!(family = family.name(), error = %e, "failed to spawn worker");
                }
            }
        }
        drop(tx);

        let mut snapshot = self
            .last_good
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let mut timing = CollectorTiming::default();

        for _ in 0..expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((result, elapsed)) => {
                    let family = result.family();
                    trace!(family = family.name(), ?elapsed, "family collected");
                    timing.record(family, elapsed);
                    match result {
                        FamilyResult::Cpu(cpu) => snapshot.cpu = cpu,
                        FamilyResult::Memory(memory) => snapshot.memory = memory,
                        FamilyResult::Network(network) => snapshot.network = network,
                        FamilyResult::Disk(disks) => snapshot.disks = disks,
                        FamilyResult::Battery(battery) => snapshot.battery = battery,
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    let missing: Vec<&str> = timing.timed_out().iter().map(|f| f.name()).collect();
                    warn!(?missing, timeout = ?self.timeout, "families timed out, using previous values");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let missing: Vec<&str> = timing.timed_out().iter().map(|f| f.name()).collect();
                    warn!(?missing, "family workers exited without a result, using previous values");
                    break;
                }
            }
        }

        snapshot.uptime_secs = self.shared.uptime_secs();
        snapshot.timestamp = self.shared.clock.unix_time();

        timing.total = total_start.elapsed();
        *self.last_timing.write().unwrap_or_else(|e| e.into_inner()) = Some(timing);
        *self.last_good.write().unwrap_or_else(|e| e.into_inner()) = snapshot.clone();

        snapshot
    }

    fn process_collector(&self) -> MutexGuard<'_, ProcessCollector<F>> {
        self.processes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Walks `/proc` and returns the process table sorted by `sort_by`.
    pub fn processes(&self, sort_by: SortBy, descending: bool) -> ProcessList {
        let system = &self.shared.system;
        let ctx = ProcessContext {
            mem_total: system.read_memory_info().map(|m| m.mem_total).unwrap_or(0),
            uptime_secs: system.read_uptime().unwrap_or(0.0),
            now_unix: self.shared.clock.unix_time(),
        };

        let mut collector = self.process_collector();
        if let Some(boot_time) = system.read_boot_time() {
            collector.set_boot_time(boot_time);
        }
        collector.collect_all(&ctx, sort_by, descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MOCK_UNIX_START, MockClock, MockFs};
    use crate::collector::procfs::CpuTimes;
    use crate::collector::traits::FsUsage;
    use approx::assert_relative_eq;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicUsize;

    fn collector(fs: MockFs) -> (Arc<MockClock>, StatsCollector<MockFs>) {
        let clock = Arc::new(MockClock::new());
        let c = StatsCollector::with_clock(fs, "/proc", "/sys", clock.clone());
        (clock, c)
    }

    fn sample(entries: &[(&str, u64, u64)]) -> CpuAccounting {
        entries
            .iter()
            .map(|&(k, total, idle)| (k.to_string(), CpuTimes { total, idle }))
            .collect()
    }

    #[test]
    fn test_core_indices_sorted_numerically() {
        let s = sample(&[("cpu", 1, 1), ("cpu10", 1, 1), ("cpu2", 1, 1), ("cpu0", 1, 1)]);
        assert_eq!(core_indices(&s), vec![0, 2, 10]);
    }

    #[test]
    fn test_derive_usage_skips_new_cores() {
        let prev = sample(&[("cpu", 1000, 800), ("cpu0", 500, 400)]);
        let curr = sample(&[("cpu", 2000, 1500), ("cpu0", 1000, 700), ("cpu1", 500, 100)]);

        let usage = derive_usage(&prev, &curr);
        assert_relative_eq!(usage.overall, 30.0);
        assert_eq!(usage.cores.len(), 1);
        assert_relative_eq!(usage.cores[0], 40.0);
    }

    #[test]
    fn test_first_snapshot_seeds_cpu_usage() {
        let (_, c) = collector(MockFs::typical_system());
        let snap = c.snapshot();

        assert_eq!(snap.cpu.usage, 0.0);
        assert_eq!(snap.cpu.cores, vec![0.0; 4]);
        assert_eq!(snap.cpu.model, "Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz");
        assert_relative_eq!(snap.cpu.frequency, 1992.002);
        assert_eq!(snap.cpu.temperature, Some(45.5));
        assert_eq!(snap.timestamp, MOCK_UNIX_START);
        assert_eq!(snap.uptime_secs, 12_345);
    }

    #[test]
    fn test_cpu_usage_delta() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        c.snapshot();

        fs.add_file(
            "/proc/stat",
            "\
cpu  10150 500 3150 80700 1000 200 100 0 0 0
cpu0 2600 125 750 20100 250 50 25 0 0 0
cpu1 2500 125 750 20200 250 50 25 0 0 0
cpu2 2550 125 800 20100 250 50 25 0 0 0
cpu3 2500 125 750 20200 250 50 25 0 0 0
",
        );
        clock.advance(Duration::from_secs(1));
        let snap = c.snapshot();

        // +1000 total, +700 idle
        assert_relative_eq!(snap.cpu.usage, 30.0);
        assert_eq!(snap.cpu.cores.len(), 4);
        assert_relative_eq!(snap.cpu.cores[0], 50.0);
        assert_relative_eq!(snap.cpu.cores[1], 0.0);
        assert_relative_eq!(snap.cpu.cores[2], 50.0);
        assert_relative_eq!(snap.cpu.cores[3], 0.0);
    }

    #[test]
    fn test_cpu_usage_served_from_cache_within_ttl() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        c.snapshot();

        fs.add_file("/proc/stat", "cpu  10150 500 3150 80700 1000 200 100 0 0 0\n");
        clock.advance(Duration::from_secs(1));
        let first = c.snapshot();
        assert_relative_eq!(first.cpu.usage, 30.0);

        // Fully busy, but the derived value is still fresh
        fs.add_file("/proc/stat", "cpu  11150 500 3150 80700 1000 200 100 0 0 0\n");
        clock.advance(Duration::from_millis(500));
        assert_relative_eq!(c.snapshot().cpu.usage, 30.0);

        clock.advance(Duration::from_millis(500));
        assert_relative_eq!(c.snapshot().cpu.usage, 100.0);
    }

    #[test]
    fn test_cpu_usage_too_soon_reuses_last_value() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        c.snapshot();

        fs.add_file("/proc/stat", "cpu  10150 500 3150 80700 1000 200 100 0 0 0\n");
        clock.advance(Duration::from_millis(50));
        let snap = c.snapshot();
        assert_eq!(snap.cpu.usage, 0.0);
    }

    #[test]
    fn test_cpu_usage_too_soon_keeps_derived_value() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        c.snapshot();

        fs.add_file("/proc/stat", "cpu  10150 500 3150 80700 1000 200 100 0 0 0\n");
        clock.advance(Duration::from_secs(1));
        assert_relative_eq!(c.snapshot().cpu.usage, 30.0);

        // Usage expired, baseline restamped so the next read comes 50ms after it
        clock.advance(Duration::from_secs(1));
        let baseline = c.shared.cache.previous_sample().unwrap();
        c.shared.cache.set_previous_sample(baseline.clone());
        fs.add_file("/proc/stat", "cpu  11150 500 3150 80700 1000 200 100 0 0 0\n");
        clock.advance(Duration::from_millis(50));

        assert_relative_eq!(c.snapshot().cpu.usage, 30.0);
        assert_eq!(c.shared.cache.previous_sample(), Some(baseline));
    }

    #[test]
    fn test_model_cached_for_a_day() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        c.snapshot();

        fs.add_file("/proc/cpuinfo", "model name\t: Other CPU\ncpu MHz\t\t: 800.0\n");
        clock.advance(Duration::from_secs(31));
        let snap = c.snapshot();

        // Frequency refreshed, model still cached
        assert_eq!(snap.cpu.model, "Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz");
        assert_relative_eq!(snap.cpu.frequency, 800.0);

        c.clear_cache();
        assert_eq!(c.snapshot().cpu.model, "Other CPU");
    }

    #[test]
    fn test_temperature_ttl() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        assert_eq!(c.snapshot().cpu.temperature, Some(45.5));

        fs.add_file("/sys/class/thermal/thermal_zone0/temp", "50000\n");
        clock.advance(Duration::from_secs(4));
        assert_eq!(c.snapshot().cpu.temperature, Some(45.5));

        clock.advance(Duration::from_secs(1));
        assert_eq!(c.snapshot().cpu.temperature, Some(50.0));
    }

    #[test]
    fn test_memory_stats() {
        let (_, c) = collector(MockFs::typical_system());
        let mem = c.snapshot().memory;

        assert_eq!(mem.total, 16_384_000_000);
        assert_eq!(mem.available, 8_192_000_000);
        assert_eq!(mem.used, 8_192_000_000);
        assert_eq!(mem.free, 2_048_000_000);
        assert_eq!(mem.swap_total, 4_194_304_000);
        assert_eq!(mem.swap_used, 1_048_576_000);
        assert_relative_eq!(mem.usage_percent, 50.0);
    }

    #[test]
    fn test_memory_without_available_uses_free() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemFree: 250 kB\n");
        let (_, c) = collector(fs);
        let mem = c.snapshot().memory;

        assert_eq!(mem.available, 256_000);
        assert_relative_eq!(mem.usage_percent, 75.0);
    }

    #[test]
    fn test_network_stats_and_rates() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        let first = c.snapshot().network;

        assert_eq!(first.interfaces.len(), 2);
        let eth0 = &first.interfaces[0];
        assert_eq!(eth0.name, "eth0");
        assert_eq!(eth0.status, "up");
        assert_eq!(eth0.speed, "1000 Mb/s");
        assert_eq!(eth0.rx_rate, 0.0);
        let wlan0 = &first.interfaces[1];
        assert_eq!(wlan0.status, "down");
        assert_eq!(wlan0.speed, "unknown");
        assert_eq!(first.total_rx, 987_654_321 + 1000);
        assert_eq!(first.total_tx, 123_456_789 + 2000);

        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
  eth0: 987664321   654331    5   10    0     0          0       100 123461789   456799    2    5    0     0       0          0
 wlan0:     1000       10    0    0    0     0          0         0     2000       20    0    0    0     0       0          0
",
        );
        clock.advance(Duration::from_secs(2));
        let second = c.snapshot().network;

        assert_relative_eq!(second.interfaces[0].rx_rate, 5_000.0);
        assert_relative_eq!(second.interfaces[0].tx_rate, 2_500.0);
        assert_relative_eq!(second.rx_rate, 5_000.0);
        assert_relative_eq!(second.interfaces[1].rx_rate, 0.0);
    }

    #[test]
    fn test_network_totals_saturate() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
  eth0: 18446744073709551000 1 0 0 0 0 0 0 18446744073709551000 1 0 0 0 0 0 0
  eth1: 1000 1 0 0 0 0 0 0 1000 1 0 0 0 0 0 0
",
        );
        let (_, c) = collector(fs);
        let network = c.snapshot().network;

        assert_eq!(network.interfaces.len(), 2);
        assert_eq!(network.total_rx, u64::MAX);
        assert_eq!(network.total_tx, u64::MAX);
        assert!(c.last_timing().unwrap().timed_out().is_empty());
    }

    #[test]
    fn test_disk_stats_and_rates() {
        let mut fs = MockFs::typical_system();
        let (clock, c) = collector(fs.clone());
        let disks = c.snapshot().disks;

        assert_eq!(disks.len(), 2);
        let root = &disks[0];
        assert_eq!(root.device, "/dev/sda1");
        assert_eq!(root.mountpoint, "/");
        assert_eq!(root.filesystem, "ext4");
        assert_eq!(root.total, 100_000_000_000);
        assert_eq!(root.used, 75_000_000_000);
        assert_relative_eq!(root.usage_percent, 75.0);
        assert_eq!(root.read_ops, 12345);
        assert_eq!(root.read_bytes, 987_654 * 512);
        assert_eq!(root.write_ops, 6789);
        assert_eq!(root.write_bytes, 456_789 * 512);
        assert_relative_eq!(disks[1].usage_percent, 25.0);

        fs.add_file(
            "/proc/diskstats",
            "   8       0 sda 12445 100 989654 5000 6889 50 457789 3000 0 4000 8000 0 0 0 0\n",
        );
        clock.advance(Duration::from_secs(1));
        let disks = c.snapshot().disks;
        assert_relative_eq!(disks[0].read_rate, 2_000.0 * 512.0);
        assert_relative_eq!(disks[0].write_rate, 1_000.0 * 512.0);
    }

    #[test]
    fn test_battery_absent() {
        let (_, c) = collector(MockFs::typical_system());
        assert_eq!(c.snapshot().battery, BatteryStats::not_available());
    }

    #[test]
    fn test_battery_present() {
        let (_, c) = collector(MockFs::laptop());
        let bat = c.snapshot().battery;

        assert_eq!(bat.level, 76);
        assert_eq!(bat.status, "Discharging");
        assert!(!bat.is_charging);
        // 38 Wh at 9.5 W
        assert_eq!(bat.time_left, "4h 0m");
        // 50 / 57
        assert_eq!(bat.health, 87);
    }

    #[test]
    fn test_battery_without_energy_uses_level_estimate() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/power_supply/BAT0/capacity", "45\n");
        let (_, c) = collector(fs.clone());
        let bat = c.snapshot().battery;

        assert_eq!(bat.status, "Unknown");
        assert_eq!(bat.time_left, "4h 30m");
        assert_eq!(bat.health, 100);

        fs.add_file("/sys/class/power_supply/BAT0/status", "Charging\n");
        let bat = c.snapshot().battery;
        assert!(bat.is_charging);
        assert_eq!(bat.time_left, "N/A");
    }

    #[test]
    fn test_container_degrades_gracefully() {
        let (_, c) = collector(MockFs::container());
        let snap = c.snapshot();

        assert_eq!(snap.cpu.model, "Unknown CPU");
        assert_eq!(snap.cpu.frequency, 0.0);
        assert_eq!(snap.cpu.temperature, None);
        assert_eq!(snap.cpu.cores, vec![0.0]);
        assert_eq!(snap.memory.total, 2_048_000 * 1024);
        assert!(snap.network.interfaces.is_empty());
        assert!(snap.disks.is_empty());
        assert!(!snap.battery.is_present());
        assert_eq!(snap.uptime_secs, 360);
    }

    #[test]
    fn test_empty_filesystem_never_fails() {
        let (_, c) = collector(MockFs::new());
        let snap = c.snapshot();

        assert_eq!(snap.cpu, CpuStats::default());
        assert_eq!(snap.memory, MemoryStats::default());
        assert_eq!(snap.uptime_secs, 0);
        assert!(c.last_timing().unwrap().timed_out().is_empty());
    }

    #[test]
    fn test_processes() {
        let (_, c) = collector(MockFs::typical_system());
        let list = c.processes(SortBy::Memory, true);

        assert_eq!(list.total, 4);
        assert_eq!(list.processes[0].name, "postgres");
        assert_eq!(list.processes[0].runtime, "02:46:40");
    }

    /// Filesystem that blocks reads of one path while `slow` is set.
    #[derive(Clone)]
    struct SlowFs {
        inner: MockFs,
        slow_path: PathBuf,
        delay: Duration,
        slow: Arc<AtomicBool>,
        blocked: Arc<AtomicUsize>,
        peak_blocked: Arc<AtomicUsize>,
    }

    impl SlowFs {
        fn new(inner: MockFs, slow_path: &str, delay: Duration) -> Self {
            Self {
                inner,
                slow_path: PathBuf::from(slow_path),
                delay,
                slow: Arc::new(AtomicBool::new(false)),
                blocked: Arc::new(AtomicUsize::new(0)),
                peak_blocked: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl FileSystem for SlowFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            if self.slow.load(Ordering::SeqCst) && path == self.slow_path {
                let now_blocked = self.blocked.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_blocked.fetch_max(now_blocked, Ordering::SeqCst);
                thread::sleep(self.delay);
                self.blocked.fetch_sub(1, Ordering::SeqCst);
            }
            self.inner.read_to_string(path)
        }

        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
            self.inner.read_dir(path)
        }

        fn fs_stats(&self, path: &Path) -> io::Result<FsUsage> {
            self.inner.fs_stats(path)
        }
    }

    #[test]
    fn test_slow_family_falls_back_to_last_good() {
        let mut inner = MockFs::typical_system();
        let fs = SlowFs::new(inner.clone(), "/proc/mounts", Duration::from_millis(1500));
        let slow = fs.slow.clone();
        let c = StatsCollector::with_clock(fs, "/proc", "/sys", Arc::new(MockClock::new()))
            .with_timeout(Duration::from_millis(300));

        let first = c.snapshot();
        assert_eq!(first.disks.len(), 2);

        slow.store(true, Ordering::SeqCst);
        inner.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemAvailable: 500 kB\n");

        let started = Instant::now();
        let second = c.snapshot();

        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(second.disks, first.disks);
        assert_eq!(second.memory.total, 1_024_000);
        assert_eq!(c.last_timing().unwrap().timed_out(), vec![Family::Disk]);
    }

    #[test]
    fn test_blocked_family_is_not_respawned() {
        let fs = SlowFs::new(MockFs::typical_system(), "/proc/mounts", Duration::from_millis(400));
        let slow = fs.slow.clone();
        let peak = fs.peak_blocked.clone();
        let c = StatsCollector::with_clock(fs, "/proc", "/sys", Arc::new(MockClock::new()))
            .with_timeout(Duration::from_millis(100));

        let first = c.snapshot();
        assert_eq!(first.disks.len(), 2);

        slow.store(true, Ordering::SeqCst);
        for _ in 0..5 {
            let snap = c.snapshot();
            assert_eq!(snap.disks, first.disks);
            assert_eq!(c.last_timing().unwrap().timed_out(), vec![Family::Disk]);
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);

        // Once the stuck worker returns the family is collected again
        slow.store(false, Ordering::SeqCst);
        let flag = &c.shared.in_flight[Family::Disk.index()];
        for _ in 0..100 {
            if !flag.load(Ordering::Acquire) {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        c.snapshot();
        assert!(c.last_timing().unwrap().timed_out().is_empty());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
