//! Process collector for gathering per-process metrics from `/proc/[pid]/`.

use std::path::Path;

use tracing::{debug, trace};

use crate::collector::error::CollectError;
use crate::collector::procfs::parser::{
    UserResolver, format_cmdline, parse_proc_stat, parse_proc_status,
};
use crate::collector::traits::FileSystem;
use crate::fmt::format_runtime;
use crate::models::{Process, ProcessList, SortBy};
use crate::rates::{CLK_TCK, memory_usage_percent, process_cpu_percent};

const PASSWD_PATH: &str = "/etc/passwd";

/// System-wide values every process row is computed against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessContext {
    /// MemTotal in bytes.
    pub mem_total: u64,
    /// Seconds since boot.
    pub uptime_secs: f64,
    /// Current wall-clock time (seconds since epoch).
    pub now_unix: i64,
}

/// Collects process information from `/proc/[pid]/` files.
pub struct ProcessCollector<F: FileSystem> {
    fs: F,
    proc_path: String,
    users: UserResolver,
    /// System boot time (seconds since epoch), used to calculate process runtime.
    boot_time: u64,
}

impl<F: FileSystem> ProcessCollector<F> {
    /// Creates a new process collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            users: UserResolver::new(),
            boot_time: 0,
        }
    }

    /// Sets the system boot time for calculating process runtimes.
    ///
    /// # Arguments
    /// * `boot_time` - System boot time in seconds since epoch (from `/proc/stat` btime)
    pub fn set_boot_time(&mut self, boot_time: u64) {
        self.boot_time = boot_time;
    }

    /// Loads `/etc/passwd` on first use.
    fn ensure_users(&mut self) {
        if self.users.is_loaded() {
            return;
        }
        match self.fs.read_to_string(Path::new(PASSWD_PATH)) {
            Ok(content) => self.users.load_from_content(&content),
            Err(e) => debug!(error = %e, "passwd unavailable, showing numeric uids"),
        }
    }

    /// Seconds the process has been running.
    ///
    /// Formula: now - (boot_time + starttime_jiffies / CLK_TCK), falling back
    /// to uptime when the boot time is unknown.
    fn runtime_secs(&self, starttime: u64, ctx: &ProcessContext) -> u64 {
        let start_offset = starttime / CLK_TCK;
        if self.boot_time == 0 {
            return (ctx.uptime_secs as u64).saturating_sub(start_offset);
        }
        let started_at = self.boot_time.saturating_add(start_offset);
        u64::try_from(ctx.now_unix)
            .unwrap_or(0)
            .saturating_sub(started_at)
    }

    /// Collects information about a single process.
    pub fn collect_process(&self, pid: u32, ctx: &ProcessContext) -> Result<Process, CollectError> {
        let proc_dir = format!("{}/{}", self.proc_path, pid);

        let stat_path = format!("{}/stat", proc_dir);
        let stat_content = self
            .fs
            .read_to_string(Path::new(&stat_path))
            .map_err(|_| CollectError::ProcessGone(pid))?;
        let stat =
            parse_proc_stat(&stat_content).map_err(|e| CollectError::parse(&stat_path, e))?;

        let status_path = format!("{}/status", proc_dir);
        let status_content = self
            .fs
            .read_to_string(Path::new(&status_path))
            .map_err(|_| CollectError::ProcessGone(pid))?;
        let status = parse_proc_status(&status_content);

        // cmdline may be unreadable for other users' processes
        let command = self
            .fs
            .read_to_string(Path::new(&format!("{}/cmdline", proc_dir)))
            .map(|c| format_cmdline(&c))
            .unwrap_or_else(|_| "unknown".to_string());

        let name = if status.name.is_empty() {
            stat.comm.clone()
        } else {
            status.name.clone()
        };

        let user = status
            .uid
            .map(|uid| self.users.resolve(uid))
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Process {
            pid,
            name,
            command,
            cpu_percent: process_cpu_percent(
                stat.utime.saturating_add(stat.stime),
                stat.starttime,
                ctx.uptime_secs,
            ),
            mem_percent: memory_usage_percent(status.vm_rss, ctx.mem_total),
            rss: status.vm_rss,
            status: stat.state.to_string(),
            user,
            runtime: format_runtime(self.runtime_secs(stat.starttime, ctx)),
            priority: stat.priority,
        })
    }

    /// Returns the PIDs of all numeric entries under the proc path.
    pub fn list_pids(&self) -> Result<Vec<u32>, CollectError> {
        let entries = self
            .fs
            .read_dir(Path::new(&self.proc_path))
            .map_err(|e| CollectError::io(&self.proc_path, e))?;

        let mut pids: Vec<u32> = entries
            .iter()
            .filter_map(|p| p.file_name()?.to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Walks every process and returns the sorted table.
    ///
    /// Processes that exit mid-walk, or whose files are malformed, are skipped.
    pub fn collect_all(&mut self, ctx: &ProcessContext, sort_by: SortBy, descending: bool) -> ProcessList {
        self.ensure_users();

        let pids = match self.list_pids() {
            Ok(pids) => pids,
            Err(e) => {
                debug!(error = %e, "process table unavailable");
                return ProcessList::default();
            }
        };

        let mut processes = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.collect_process(pid, ctx) {
                Ok(p) => processes.push(p),
                Err(CollectError::ProcessGone(pid)) => trace!(pid, "process exited during walk"),
                Err(e) => debug!(pid, error = %e, "skipping process"),
            }
        }

        ProcessList::from_processes(processes, sort_by, descending)
    }
}
