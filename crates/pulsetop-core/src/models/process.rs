use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One row of the process table.
///
/// Source: `/proc/[pid]/{stat,status,cmdline}`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Process {
    pub pid: u32,
    /// Source: status "Name"
    pub name: String,
    /// Command line with NULs replaced by spaces, truncated to 50 chars.
    pub command: String,
    /// Percentage of one core consumed since process start.
    pub cpu_percent: f64,
    /// Resident set size relative to MemTotal.
    pub mem_percent: f64,
    /// Resident set size in bytes.
    /// Source: status "VmRSS"
    pub rss: u64,
    /// Single-letter state (`R`, `S`, `D`, `Z`, ...).
    /// Source: stat field 3
    pub status: String,
    /// Owner name, or numeric UID when not in `/etc/passwd`.
    pub user: String,
    /// Time since process start as `HH:MM:SS`.
    pub runtime: String,
    /// Source: stat field 18
    pub priority: i32,
}

/// Process table with state counts.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ProcessList {
    pub processes: Vec<Process>,
    pub total: usize,
    /// Processes in state `R`.
    pub running: usize,
    /// Processes in state `S` or `D`.
    pub sleeping: usize,
    /// Processes in state `Z`.
    pub zombie: usize,
}

/// Process table sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    Pid,
    #[default]
    Cpu,
    Memory,
    Name,
}

impl SortBy {
    fn compare(self, a: &Process, b: &Process) -> Ordering {
        match self {
            SortBy::Pid => a.pid.cmp(&b.pid),
            SortBy::Cpu => a.cpu_percent.total_cmp(&b.cpu_percent),
            SortBy::Memory => a.mem_percent.total_cmp(&b.mem_percent),
            SortBy::Name => a.name.cmp(&b.name),
        }
    }
}

impl ProcessList {
    /// Builds a list from collected rows, counting states and sorting.
    pub fn from_processes(mut processes: Vec<Process>, sort_by: SortBy, descending: bool) -> Self {
        let mut list = ProcessList::default();

        for p in &processes {
            match p.status.as_str() {
                "R" => list.running += 1,
                "S" | "D" => list.sleeping += 1,
                "Z" => list.zombie += 1,
                _ => {}
            }
        }

        processes.sort_by(|a, b| {
            let ord = sort_by.compare(a, b).then_with(|| a.pid.cmp(&b.pid));
            if descending { ord.reverse() } else { ord }
        });

        list.total = processes.len();
        list.processes = processes;
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(pid: u32, name: &str, cpu: f64, mem: f64, status: &str) -> Process {
        Process {
            pid,
            name: name.to_string(),
            cpu_percent: cpu,
            mem_percent: mem,
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Process> {
        vec![
            proc(30, "bash", 1.0, 0.5, "S"),
            proc(10, "postgres", 25.0, 12.0, "R"),
            proc(20, "kworker", 0.0, 0.0, "D"),
            proc(40, "defunct", 0.0, 0.0, "Z"),
            proc(50, "idle", 0.0, 0.0, "I"),
        ]
    }

    #[test]
    fn test_counts_states() {
        let list = ProcessList::from_processes(sample(), SortBy::Pid, false);
        assert_eq!(list.total, 5);
        assert_eq!(list.running, 1);
        assert_eq!(list.sleeping, 2);
        assert_eq!(list.zombie, 1);
    }

    #[test]
    fn test_sort_by_cpu_descending() {
        let list = ProcessList::from_processes(sample(), SortBy::Cpu, true);
        let pids: Vec<u32> = list.processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![10, 30, 50, 40, 20]);
    }

    #[test]
    fn test_sort_by_name_and_pid() {
        let list = ProcessList::from_processes(sample(), SortBy::Name, false);
        assert_eq!(list.processes[0].name, "bash");
        assert_eq!(list.processes[4].name, "postgres");

        let list = ProcessList::from_processes(sample(), SortBy::Pid, true);
        assert_eq!(list.processes[0].pid, 50);
    }

    #[test]
    fn test_sort_by_memory() {
        let list = ProcessList::from_processes(sample(), SortBy::Memory, true);
        assert_eq!(list.processes[0].pid, 10);
        assert_eq!(list.processes[1].pid, 30);
    }
}
