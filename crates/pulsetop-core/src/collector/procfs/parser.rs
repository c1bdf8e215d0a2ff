//! Parsers for `/proc` and `/sys` file contents.
//!
//! These are pure functions that turn the content of kernel-exposed text files
//! into structured records. They never touch the filesystem, so every edge
//! case can be pinned with a literal string in a test.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Bytes per sector in `/proc/diskstats`, fixed by the kernel regardless of
/// the device's physical sector size.
pub const SECTOR_SIZE: u64 = 512;

/// Maximum number of `/proc/stat` cpu columns that are summed into `total`.
const MAX_CPU_FIELDS: usize = 10;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

// ============ CPU accounting (/proc/stat) ============

/// Accumulated clock ticks for one CPU counter identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimes {
    /// Sum of the first (up to 10) accounting columns.
    pub total: u64,
    /// `idle + iowait`.
    pub idle: u64,
}

/// Mapping from counter name (`cpu`, `cpu0`, `cpu1`, ...) to its ticks.
pub type CpuAccounting = HashMap<String, CpuTimes>;

/// Parses the `cpu*` lines of `/proc/stat`.
///
/// Lines with fewer than 4 numeric columns, or with a non-numeric column among
/// the first 10, are skipped, as are lines whose counters overflow `u64` when
/// summed. Entries whose total is zero are dropped.
pub fn parse_cpu_accounting(content: &str) -> Result<CpuAccounting, ParseError> {
    let mut accounting = CpuAccounting::new();

    for line in content.lines() {
        if !line.starts_with("cpu") {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };

        let values: Result<Vec<u64>, _> = parts
            .take(MAX_CPU_FIELDS)
            .map(|s| s.parse::<u64>())
            .collect();
        let Ok(values) = values else {
            continue;
        };
        if values.len() < 4 {
            continue;
        }

        // Counters that overflow when summed are treated as malformed
        let Some(total) = values.iter().try_fold(0u64, |acc, &v| acc.checked_add(v)) else {
            continue;
        };
        let Some(idle) = values[3].checked_add(values.get(4).copied().unwrap_or(0)) else {
            continue;
        };

        if total > 0 {
            accounting.insert(name.to_string(), CpuTimes { total, idle });
        }
    }

    if accounting.is_empty() {
        return Err(ParseError::new("no cpu lines in stat"));
    }

    Ok(accounting)
}

/// Extracts the `btime` (boot time, seconds since epoch) line of `/proc/stat`.
pub fn parse_boot_time(content: &str) -> Result<u64, ParseError> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("btime "))
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ParseError::new("missing btime in stat"))
}

// ============ CPU identity (/proc/cpuinfo) ============

/// Model name and current clock of the first CPU listed in `/proc/cpuinfo`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuIdentity {
    pub model: Option<String>,
    pub mhz: Option<f64>,
}

/// Parses `/proc/cpuinfo`, stopping as soon as both values are known.
pub fn parse_cpuinfo(content: &str) -> CpuIdentity {
    let mut identity = CpuIdentity::default();

    for line in content.lines() {
        if identity.model.is_some() && identity.mhz.is_some() {
            break;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();

        if identity.model.is_none() && key == "model name" {
            identity.model = Some(value.trim().to_string());
        } else if identity.mhz.is_none() && key == "cpu MHz" {
            identity.mhz = value.trim().parse().ok();
        }
    }

    identity
}

// ============ Temperature sensors ============

/// Parses a thermal sensor reading into degrees Celsius.
///
/// Readings above 1000 are millidegrees. The normalized value must fall in
/// `[0, 150]`.
pub fn parse_temperature(content: &str) -> Result<f32, ParseError> {
    let raw: f32 = content
        .trim()
        .parse()
        .map_err(|_| ParseError::new(format!("invalid temperature value: {}", content.trim())))?;

    let celsius = if raw > 1000.0 { raw / 1000.0 } else { raw };

    if !(0.0..=150.0).contains(&celsius) {
        return Err(ParseError::new(format!(
            "temperature out of range: {:.1}",
            celsius
        )));
    }

    Ok(celsius)
}

// ============ Memory (/proc/meminfo) ============

/// Memory counters from `/proc/meminfo`, in bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    /// `None` on kernels older than 3.14 that lack the line.
    pub mem_available: Option<u64>,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Parses `/proc/meminfo` content.
///
/// Values carrying a `kB` unit are converted to bytes; unitless values (such
/// as `HugePages_Total`) are kept as-is. Lines without a numeric value are
/// skipped.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut seen_total = false;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let mut parts = rest.split_whitespace();
        let Some(value) = parts.next().and_then(|s| s.parse::<u64>().ok()) else {
            continue;
        };
        let bytes = match parts.next() {
            Some("kB") => value.saturating_mul(1024),
            _ => value,
        };

        match key.trim() {
            "MemTotal" => {
                info.mem_total = bytes;
                seen_total = true;
            }
            "MemFree" => info.mem_free = bytes,
            "MemAvailable" => info.mem_available = Some(bytes),
            "SwapTotal" => info.swap_total = bytes,
            "SwapFree" => info.swap_free = bytes,
            _ => {}
        }
    }

    if !seen_total {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }

    Ok(info)
}

// ============ Network Device Stats Parser ============

/// Cumulative counters for one interface from `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceCounters {
    /// Interface name (eth0, wlan0, etc.)
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

/// Parses `/proc/net/dev` content, skipping the loopback interface.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///  eth0: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
pub fn parse_net_dev(content: &str) -> Result<Vec<InterfaceCounters>, ParseError> {
    let mut interfaces = Vec::new();

    // First two lines are the column headers
    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name == "lo" {
            continue;
        }

        let values: Vec<&str> = rest.split_whitespace().collect();
        if values.len() < 16 {
            continue;
        }

        let get_val = |idx: usize| -> Option<u64> { values.get(idx).and_then(|s| s.parse().ok()) };
        let (Some(rx_bytes), Some(rx_packets), Some(tx_bytes), Some(tx_packets)) =
            (get_val(0), get_val(1), get_val(8), get_val(9))
        else {
            continue;
        };

        interfaces.push(InterfaceCounters {
            name: name.to_string(),
            rx_bytes,
            rx_packets,
            tx_bytes,
            tx_packets,
        });
    }

    Ok(interfaces)
}

/// Formats the content of `/sys/class/net/<if>/speed`.
///
/// Down links report `-1`; those read as `None`.
pub fn parse_link_speed(content: &str) -> Option<String> {
    let speed: i64 = content.trim().parse().ok()?;
    (speed >= 0).then(|| format!("{} Mb/s", speed))
}

// ============ Mounts & Disk Stats ============

/// A block-device backed mount from `/proc/mounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
}

/// Parses `/proc/mounts`, keeping only real block devices.
///
/// Pseudo filesystems, loop devices and `tmpfs` are skipped.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mountpoint = fields.next()?;
            let fstype = fields.next()?;

            if !device.starts_with("/dev") || device.contains("loop") || fstype == "tmpfs" {
                return None;
            }

            Some(MountEntry {
                device: device.to_string(),
                mountpoint: mountpoint.to_string(),
                fstype: fstype.to_string(),
            })
        })
        .collect()
}

/// Cumulative I/O counters for one block device from `/proc/diskstats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskIo {
    /// Number of reads completed
    pub reads: u64,
    /// Bytes read (sectors * 512)
    pub read_bytes: u64,
    /// Number of writes completed
    pub writes: u64,
    /// Bytes written (sectors * 512)
    pub write_bytes: u64,
}

/// Derives the `/proc/diskstats` name to look up for a mount device.
///
/// The base name is truncated to its first three characters, so `/dev/sda1`
/// maps to `sda`. Names like `nvme0n1p1` map to `nvm` and find nothing.
pub fn diskstats_key(device: &str) -> &str {
    let base = device.rsplit('/').next().unwrap_or(device);
    match base.char_indices().nth(3) {
        Some((idx, _)) => &base[..idx],
        None => base,
    }
}

/// Finds the I/O counters for `device` in `/proc/diskstats` content.
///
/// Lines with fewer than 14 columns are skipped.
pub fn parse_diskstats_for(content: &str, device: &str) -> Option<DiskIo> {
    let key = diskstats_key(device);

    content.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 || parts[2] != key {
            return None;
        }

        let get_val = |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        Some(DiskIo {
            reads: get_val(3),
            read_bytes: get_val(5).saturating_mul(SECTOR_SIZE),
            writes: get_val(7),
            write_bytes: get_val(9).saturating_mul(SECTOR_SIZE),
        })
    })
}

// ============ Uptime ============

/// Parses the first column of `/proc/uptime` (seconds since boot).
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::new("invalid uptime"))
}

// ============ Per-process files ============

// Positions after the closing `)` of comm.
const STAT_STATE: usize = 0;
const STAT_UTIME: usize = 11;
const STAT_STIME: usize = 12;
const STAT_PRIORITY: usize = 15;
const STAT_STARTTIME: usize = 19;

/// Fields of `/proc/[pid]/stat` needed for the process table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub utime: u64,
    pub stime: u64,
    pub priority: i32,
    pub starttime: u64,
}

/// Parses one `/proc/[pid]/stat` line.
///
/// `comm` may itself contain spaces and parentheses, so it spans from the
/// first `(` to the last `)`. Field indices below count from the state
/// character that follows it.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let line = content.trim();
    let (head, rest) = line
        .split_once('(')
        .ok_or_else(|| ParseError::new("stat has no comm"))?;
    let (comm, tail) = rest
        .rsplit_once(')')
        .ok_or_else(|| ParseError::new("stat comm is unterminated"))?;

    let pid = head
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::new(format!("bad pid {:?}", head.trim())))?;

    let fields: Vec<&str> = tail.split_whitespace().collect();
    if fields.len() <= STAT_STARTTIME {
        return Err(ParseError::new(format!(
            "stat for pid {} has {} fields after comm",
            pid,
            fields.len()
        )));
    }

    let ticks = |idx: usize| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("bad stat field {} for pid {}", idx, pid)))
    };

    Ok(ProcStat {
        pid,
        comm: comm.to_string(),
        state: fields[STAT_STATE].chars().next().unwrap_or('?'),
        utime: ticks(STAT_UTIME)?,
        stime: ticks(STAT_STIME)?,
        priority: fields[STAT_PRIORITY].parse().unwrap_or(20),
        starttime: ticks(STAT_STARTTIME)?,
    })
}

/// Fields of `/proc/[pid]/status` needed for the process table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStatus {
    pub name: String,
    /// Real UID.
    pub uid: Option<u32>,
    /// Resident set size in bytes. Zero for kernel threads.
    pub vm_rss: u64,
}

/// Parses `/proc/[pid]/status` content.
///
/// Format is key:\tvalue pairs, one per line.
pub fn parse_proc_status(content: &str) -> ProcStatus {
    let mut status = ProcStatus::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "Name" => status.name = value.trim().to_string(),
            // Uid has format: real effective saved fs
            "Uid" => {
                status.uid = value
                    .split_whitespace()
                    .next()
                    .and_then(|s| s.parse().ok())
            }
            "VmRSS" => {
                status.vm_rss = value
                    .split_whitespace()
                    .next()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(0)
                    .saturating_mul(1024)
            }
            _ => {}
        }
    }

    status
}

/// Maximum displayed command line length before truncation.
const MAX_COMMAND_LEN: usize = 50;

/// Normalizes `/proc/[pid]/cmdline` for display.
///
/// NUL separators become spaces. Commands longer than 50 characters are cut
/// to 47 and suffixed with `...`. An empty command line (kernel threads)
/// reads as `unknown`.
pub fn format_cmdline(content: &str) -> String {
    let cmdline = content.replace('\0', " ");
    let cmdline = cmdline.trim();

    if cmdline.is_empty() {
        return "unknown".to_string();
    }

    if cmdline.chars().count() > MAX_COMMAND_LEN {
        let truncated: String = cmdline.chars().take(MAX_COMMAND_LEN - 3).collect();
        return format!("{}...", truncated);
    }

    cmdline.to_string()
}

// ============ Users (/etc/passwd) ============

/// Maps uid to login name from `/etc/passwd` content.
///
/// Comment lines and lines without a numeric third field are ignored. When a
/// uid appears twice the first entry wins, as with `getpwuid`.
pub fn parse_passwd(content: &str) -> HashMap<u32, String> {
    let mut users = HashMap::new();
    for entry in content.lines().map(str::trim) {
        if entry.starts_with('#') {
            continue;
        }
        let mut cols = entry.splitn(4, ':');
        let (Some(name), Some(_), Some(uid)) = (cols.next(), cols.next(), cols.next()) else {
            continue;
        };
        if let Ok(uid) = uid.parse::<u32>() {
            users.entry(uid).or_insert_with(|| name.to_string());
        }
    }
    users
}

/// Resolves uids to login names, falling back to the numeric uid.
#[derive(Debug, Clone, Default)]
pub struct UserResolver {
    names: HashMap<u32, String>,
}

impl UserResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the known users with the entries of `passwd`.
    pub fn load_from_content(&mut self, passwd: &str) {
        self.names = parse_passwd(passwd);
    }

    pub fn resolve(&self, uid: u32) -> String {
        match self.names.get(&uid) {
            Some(name) => name.clone(),
            None => uid.to_string(),
        }
    }

    /// True once at least one user is known.
    pub fn is_loaded(&self) -> bool {
        !self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_cpu_accounting() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
intr 123456 0 0
ctxt 500000
btime 1700000000
";
        let acct = parse_cpu_accounting(content).unwrap();

        assert_eq!(acct.len(), 3);
        assert_eq!(
            acct["cpu"],
            CpuTimes {
                total: 94800,
                idle: 81000
            }
        );
        assert_eq!(acct["cpu0"].total, 23700);
        assert_eq!(acct["cpu1"].idle, 20250);
    }

    #[test]
    fn test_parse_cpu_accounting_skips_malformed_lines() {
        let content = "\
cpu  100 0 100 800
cpu0 50 0 50
cpu1 50 x 50 400 0
cpu2 50 0 50 400 0
";
        let acct = parse_cpu_accounting(content).unwrap();

        assert_eq!(acct.len(), 2);
        assert!(acct.contains_key("cpu"));
        assert!(acct.contains_key("cpu2"));
        // Only idle present, iowait missing
        assert_eq!(acct["cpu"].idle, 800);
    }

    #[test]
    fn test_parse_cpu_accounting_uses_first_ten_fields() {
        let content = "cpu 1 1 1 1 1 1 1 1 1 1 1000\n";
        let acct = parse_cpu_accounting(content).unwrap();
        assert_eq!(acct["cpu"].total, 10);
    }

    #[test]
    fn test_parse_cpu_accounting_skips_overflowing_lines() {
        let content = "cpu  18446744073709551615 1 0 0 0\ncpu0 10 0 10 80 0\n";
        let acct = parse_cpu_accounting(content).unwrap();

        assert_eq!(acct.len(), 1);
        assert_eq!(acct["cpu0"], CpuTimes { total: 100, idle: 80 });

        let idle_overflow = "cpu  1 0 0 18446744073709551615 1\n";
        assert!(parse_cpu_accounting(idle_overflow).is_err());
    }

    #[test]
    fn test_parse_cpu_accounting_drops_zero_totals() {
        assert!(parse_cpu_accounting("cpu 0 0 0 0 0\n").is_err());
        assert!(parse_cpu_accounting("").is_err());
    }

    #[test]
    fn test_parse_boot_time() {
        let content = "cpu 1 2 3 4\nbtime 1700000000\nprocesses 10\n";
        assert_eq!(parse_boot_time(content).unwrap(), 1_700_000_000);
        assert!(parse_boot_time("cpu 1 2 3 4\n").is_err());
    }

    #[test]
    fn test_parse_cpuinfo() {
        let content = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
cpu MHz\t\t: 1992.002

processor\t: 1
model name\t: Something Else
cpu MHz\t\t: 800.000
";
        let id = parse_cpuinfo(content);
        assert_eq!(
            id.model.as_deref(),
            Some("Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz")
        );
        assert_relative_eq!(id.mhz.unwrap(), 1992.002);
    }

    #[test]
    fn test_parse_cpuinfo_missing_keys() {
        // ARM cpuinfo has neither key
        let id = parse_cpuinfo("processor\t: 0\nBogoMIPS\t: 48.00\n");
        assert_eq!(id, CpuIdentity::default());
    }

    #[test]
    fn test_parse_temperature() {
        assert_relative_eq!(parse_temperature("45500\n").unwrap(), 45.5);
        assert_relative_eq!(parse_temperature("52").unwrap(), 52.0);
        assert!(parse_temperature("200000").is_err());
        assert!(parse_temperature("-5").is_err());
        assert!(parse_temperature("garbage").is_err());
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16000000 kB
MemFree:         2000000 kB
MemAvailable:    8000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        1024000 kB
HugePages_Total:       0
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16_384_000_000);
        assert_eq!(info.mem_free, 2_048_000_000);
        assert_eq!(info.mem_available, Some(8_192_000_000));
        assert_eq!(info.swap_total, 4_194_304_000);
        assert_eq!(info.swap_free, 1_048_576_000);
    }

    #[test]
    fn test_parse_meminfo_without_available() {
        let info = parse_meminfo("MemTotal: 1000 kB\nMemFree: 400 kB\nbogus line\n").unwrap();
        assert_eq!(info.mem_available, None);
        assert_eq!(info.mem_free, 409_600);
        assert!(parse_meminfo("MemFree: 400 kB\n").is_err());
    }

    #[test]
    fn test_parse_net_dev() {
        let content = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
  eth0: 9876543210 8765432    5   10    0     0          0       100 1234567890 2345678    2    5    0     0       0          0
 wlan0:1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0
  bad0: 1 2 3
";
        let ifaces = parse_net_dev(content).unwrap();

        assert_eq!(ifaces.len(), 2);
        assert_eq!(ifaces[0].name, "eth0");
        assert_eq!(ifaces[0].rx_bytes, 9876543210);
        assert_eq!(ifaces[0].rx_packets, 8765432);
        assert_eq!(ifaces[0].tx_bytes, 1234567890);
        assert_eq!(ifaces[0].tx_packets, 2345678);
        assert_eq!(ifaces[1].name, "wlan0");
        assert_eq!(ifaces[1].tx_bytes, 2000);
    }

    #[test]
    fn test_parse_link_speed() {
        assert_eq!(parse_link_speed("1000\n").as_deref(), Some("1000 Mb/s"));
        assert_eq!(parse_link_speed("-1\n"), None);
        assert_eq!(parse_link_speed(""), None);
    }

    #[test]
    fn test_parse_mounts() {
        let content = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda1 / ext4 rw,relatime 0 0
/dev/sda2 /home ext4 rw,relatime 0 0
/dev/loop0 /snap/core/1 squashfs ro,nodev,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
/dev/shm /dev/shm tmpfs rw 0 0
";
        let mounts = parse_mounts(content);

        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0].device, "/dev/sda1");
        assert_eq!(mounts[0].mountpoint, "/");
        assert_eq!(mounts[0].fstype, "ext4");
        assert_eq!(mounts[1].mountpoint, "/home");
    }

    #[test]
    fn test_diskstats_key() {
        assert_eq!(diskstats_key("/dev/sda1"), "sda");
        assert_eq!(diskstats_key("/dev/vdb"), "vdb");
        assert_eq!(diskstats_key("/dev/nvme0n1p2"), "nvm");
        assert_eq!(diskstats_key("/dev/hd"), "hd");
    }

    #[test]
    fn test_parse_diskstats_for() {
        let content = "\
   8       0 sda 10000 500 200000 5000 20000 1000 400000 10000 0 15000 15000
   8       1 sda1 9000 400 180000 4500 18000 900 360000 9000 0 13500 13500
   7       0 loop0 1 2 3
";
        let io = parse_diskstats_for(content, "/dev/sda1").unwrap();

        assert_eq!(io.reads, 10000);
        assert_eq!(io.read_bytes, 200000 * 512);
        assert_eq!(io.writes, 20000);
        assert_eq!(io.write_bytes, 400000 * 512);

        assert!(parse_diskstats_for(content, "/dev/nvme0n1p1").is_none());
    }

    #[test]
    fn test_parse_uptime() {
        assert_relative_eq!(parse_uptime("12345.67 45678.90\n").unwrap(), 12345.67);
        assert!(parse_uptime("").is_err());
    }

    #[test]
    fn test_parse_proc_stat_fields() {
        let content = "2345 (postgres) R 1 2345 2345 0 -1 4194560 9000 0 3 0 60000 20000 0 0 20 0 4 0 234500 250000000 204800 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(
            stat,
            ProcStat {
                pid: 2345,
                comm: "postgres".to_string(),
                state: 'R',
                utime: 60_000,
                stime: 20_000,
                priority: 20,
                starttime: 234_500,
            }
        );
    }

    #[test]
    fn test_parse_proc_stat_comm_with_spaces_and_parens() {
        let stat = parse_proc_stat(&crate::collector::mock::stat_line(
            808,
            "Web Content (pid 7)",
            'S',
            1,
            2,
            3,
        ))
        .unwrap();

        assert_eq!(stat.pid, 808);
        assert_eq!(stat.comm, "Web Content (pid 7)");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.starttime, 3);
    }

    #[test]
    fn test_parse_proc_stat_truncated() {
        assert!(parse_proc_stat("42 (short) S 1 2 3").is_err());
        assert!(parse_proc_stat("no parens here").is_err());
    }

    #[test]
    fn test_parse_proc_status() {
        let content = "\
Name:\tpostgres
Umask:\t0077
State:\tS (sleeping)
Pid:\t1234
PPid:\t1
Uid:\t999\t999\t999\t999
Gid:\t999\t999\t999\t999
VmRSS:\t   51200 kB
";
        let status = parse_proc_status(content);

        assert_eq!(status.name, "postgres");
        assert_eq!(status.uid, Some(999));
        assert_eq!(status.vm_rss, 51200 * 1024);
    }

    #[test]
    fn test_parse_proc_status_kernel_thread() {
        let status = parse_proc_status("Name:\tkthreadd\nUid:\t0\t0\t0\t0\n");
        assert_eq!(status.vm_rss, 0);
        assert_eq!(status.uid, Some(0));
    }

    #[test]
    fn test_format_cmdline() {
        assert_eq!(format_cmdline("/bin/bash\0--login\0"), "/bin/bash --login");
        assert_eq!(format_cmdline(""), "unknown");
        assert_eq!(format_cmdline("\0"), "unknown");

        let long = format!("/usr/bin/python3\0{}", "x".repeat(60));
        let formatted = format_cmdline(&long);
        assert_eq!(formatted.chars().count(), 50);
        assert!(formatted.ends_with("..."));

        let exact = "y".repeat(50);
        assert_eq!(format_cmdline(&exact), exact);
    }

    #[test]
    fn test_parse_passwd() {
        let content = "\
# local accounts
root:x:0:0:root:/root:/bin/bash
postgres:x:999:999:PostgreSQL administrator:/var/lib/postgresql:/bin/bash
toor:x:0:0:shadow root:/root:/bin/sh
nouid:x::100::/:/bin/false
truncated
";
        let users = parse_passwd(content);
        assert_eq!(users.len(), 2);
        assert_eq!(users[&0], "root");
        assert_eq!(users[&999], "postgres");
    }

    #[test]
    fn test_user_resolver_falls_back_to_uid() {
        let mut users = UserResolver::new();
        assert!(!users.is_loaded());
        assert_eq!(users.resolve(999), "999");

        users.load_from_content("postgres:x:999:999::/var/lib/postgresql:/bin/bash\n");
        assert!(users.is_loaded());
        assert_eq!(users.resolve(999), "postgres");
        assert_eq!(users.resolve(4242), "4242");
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let content = "cpu 100 0 100 800 0\ncpu0 50 0 50 400 0\n";
        assert_eq!(
            parse_cpu_accounting(content).unwrap(),
            parse_cpu_accounting(content).unwrap()
        );
    }
}
