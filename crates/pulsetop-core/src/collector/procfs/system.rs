//! Raw readers for system-wide counters under `/proc/`.
//!
//! Every `read_*` method fails soft: a missing or malformed source is logged
//! at debug level and reported as `None`, never as a zero value.

use std::path::Path;

use crate::collector::error::CollectError;
use crate::collector::procfs::parser::{
    CpuAccounting, CpuIdentity, DiskIo, InterfaceCounters, MemInfo, MountEntry,
    parse_boot_time, parse_cpu_accounting, parse_cpuinfo, parse_diskstats_for, parse_meminfo,
    parse_mounts, parse_net_dev, parse_uptime,
};
use crate::collector::procfs::soft;
use crate::collector::traits::{FileSystem, FsUsage};

/// Reads global counters from `/proc/`.
#[derive(Debug, Clone)]
pub struct SystemReader<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> SystemReader<F> {
    /// Creates a new system reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    fn read_file(&self, name: &str) -> Result<(String, String), CollectError> {
        let path = format!("{}/{}", self.proc_path, name);
        let content = self
            .fs
            .read_to_string(Path::new(&path))
            .map_err(|e| CollectError::io(&path, e))?;
        Ok((path, content))
    }

    /// Reads per-CPU tick accounting from `/proc/stat`.
    pub fn read_cpu_accounting(&self) -> Option<CpuAccounting> {
        soft("cpu accounting", self.collect_cpu_accounting())
    }

    fn collect_cpu_accounting(&self) -> Result<CpuAccounting, CollectError> {
        let (path, content) = self.read_file("stat")?;
        parse_cpu_accounting(&content).map_err(|e| CollectError::parse(path, e))
    }

    /// Reads model name and frequency from `/proc/cpuinfo`.
    pub fn read_cpu_identity(&self) -> Option<CpuIdentity> {
        soft(
            "cpu identity",
            self.read_file("cpuinfo")
                .map(|(_, content)| parse_cpuinfo(&content)),
        )
    }

    /// Reads `/proc/meminfo`, values in bytes.
    pub fn read_memory_info(&self) -> Option<MemInfo> {
        soft("memory info", self.collect_memory_info())
    }

    fn collect_memory_info(&self) -> Result<MemInfo, CollectError> {
        let (path, content) = self.read_file("meminfo")?;
        parse_meminfo(&content).map_err(|e| CollectError::parse(path, e))
    }

    /// Reads cumulative interface counters from `/proc/net/dev`.
    pub fn read_network_interfaces(&self) -> Option<Vec<InterfaceCounters>> {
        soft("network interfaces", self.collect_network_interfaces())
    }

    fn collect_network_interfaces(&self) -> Result<Vec<InterfaceCounters>, CollectError> {
        let (path, content) = self.read_file("net/dev")?;
        parse_net_dev(&content).map_err(|e| CollectError::parse(path, e))
    }

    /// Reads block-device mounts from `/proc/mounts`.
    pub fn read_mounts(&self) -> Option<Vec<MountEntry>> {
        soft(
            "mounts",
            self.read_file("mounts")
                .map(|(_, content)| parse_mounts(&content)),
        )
    }

    /// Reads I/O counters for the block device behind `device`.
    pub fn read_disk_io(&self, device: &str) -> Option<DiskIo> {
        let (path, content) = soft("disk io", self.read_file("diskstats"))?;
        let io = parse_diskstats_for(&content, device);
        if io.is_none() {
            tracing::debug!(device, path = %path, "no diskstats entry for device");
        }
        io
    }

    /// Queries capacity of the filesystem mounted at `mountpoint`.
    pub fn stat_filesystem(&self, mountpoint: &str) -> Option<FsUsage> {
        soft(
            "filesystem capacity",
            self.fs
                .fs_stats(Path::new(mountpoint))
                .map_err(|e| CollectError::io(mountpoint, e)),
        )
    }

    /// Reads the boot time (seconds since epoch) from `/proc/stat`.
    pub fn read_boot_time(&self) -> Option<u64> {
        soft(
            "boot time",
            self.read_file("stat").and_then(|(path, content)| {
                parse_boot_time(&content).map_err(|e| CollectError::parse(path, e))
            }),
        )
    }

    /// Reads seconds since boot from `/proc/uptime`.
    pub fn read_uptime(&self) -> Option<f64> {
        soft(
            "uptime",
            self.read_file("uptime").and_then(|(path, content)| {
                parse_uptime(&content).map_err(|e| CollectError::parse(path, e))
            }),
        )
    }
}
