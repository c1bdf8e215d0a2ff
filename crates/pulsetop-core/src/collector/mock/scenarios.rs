//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/sys` states for testing
//! various system conditions. Literal file contents are pinned here so tests
//! can assert exact derived values.

use super::clock::MOCK_UNIX_START;
use super::filesystem::MockFs;

/// Seconds since boot reported by the scenarios' `/proc/uptime`.
pub const MOCK_UPTIME_SECS: u64 = 12_345;

/// Builds a `/proc/[pid]/stat` line with the fields the collector reads.
pub fn stat_line(pid: u32, comm: &str, state: char, utime: u64, stime: u64, starttime: u64) -> String {
    format!(
        "{pid} ({comm}) {state} 1 {pid} {pid} 0 -1 4194304 1000 0 0 0 {utime} {stime} 0 0 20 0 1 0 {starttime} 25000000 2000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0"
    )
}

fn status(name: &str, uid: u32, rss_kb: Option<u64>) -> String {
    let mut s = format!("Name:\t{name}\nUmask:\t0022\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\nGid:\t{uid}\t{uid}\t{uid}\t{uid}\n");
    if let Some(kb) = rss_kb {
        s.push_str(&format!("VmRSS:\t{:>8} kB\n", kb));
    }
    s
}

impl MockFs {
    /// Creates a typical desktop system without a battery.
    ///
    /// Includes: 4-core CPU, 16 GB RAM (half available), eth0 up and wlan0
    /// down, two ext4 mounts on sda, a thermal zone at 45.5 °C, and four
    /// processes (systemd, bash, postgres, a zombie).
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        // /etc/passwd for user name resolution
        fs.add_file(
            "/etc/passwd",
            "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
postgres:x:999:999:PostgreSQL administrator:/var/lib/postgresql:/bin/bash
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
user:x:1000:1000:User:/home/user:/bin/bash
",
        );

        // System-wide files
        fs.add_file("/proc/uptime", format!("{}.00 45678.90\n", MOCK_UPTIME_SECS));
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16000000 kB
MemFree:         2000000 kB
MemAvailable:    8000000 kB
Buffers:          512000 kB
Cached:          4096000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        3072000 kB
",
        );
        fs.add_file(
            "/proc/stat",
            format!(
                "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime {}
processes 10000
procs_running 2
procs_blocked 0
",
                MOCK_UNIX_START as u64 - MOCK_UPTIME_SECS
            ),
        );
        fs.add_file(
            "/proc/cpuinfo",
            "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
cpu MHz\t\t: 1992.002
cache size\t: 8192 KB

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
cpu MHz\t\t: 2100.000
cache size\t: 8192 KB
",
        );

        // Network device statistics
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
 wlan0:     1000       10    0    0    0     0          0         0     2000       20    0    0    0     0       0          0
",
        );
        fs.add_file("/sys/class/net/eth0/operstate", "up\n");
        fs.add_file("/sys/class/net/eth0/speed", "1000\n");
        fs.add_file("/sys/class/net/wlan0/operstate", "down\n");
        fs.add_file("/sys/class/net/wlan0/speed", "-1\n");

        // Mounts, capacities and disk statistics
        fs.add_file(
            "/proc/mounts",
            "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda1 / ext4 rw,relatime,errors=remount-ro 0 0
/dev/sda2 /home ext4 rw,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev,noexec,relatime,size=1634000k,mode=755 0 0
/dev/loop0 /snap/core20/2015 squashfs ro,nodev,relatime 0 0
",
        );
        fs.set_capacity("/", 100_000_000_000, 25_000_000_000);
        fs.set_capacity("/home", 400_000_000_000, 300_000_000_000);
        fs.add_file(
            "/proc/diskstats",
            "\
   7       0 loop0 100 0 2000 10 0 0 0 0 0 20 10 0 0 0 0
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
   8       2 sda2 2000 20 180000 900 1700 10 56000 500 0 500 1400 0 0 0 0
",
        );

        // Sensors
        fs.add_file("/sys/class/thermal/thermal_zone0/temp", "45500\n");
        fs.add_file("/sys/class/power_supply/AC/online", "1\n");

        // Processes
        fs.add_process(
            1,
            &stat_line(1, "systemd", 'S', 1500, 800, 1),
            &status("systemd", 0, Some(12000)),
            "/sbin/init\0splash\0",
        );
        fs.add_process(
            1234,
            &stat_line(1234, "bash", 'S', 100, 50, 1_000_000),
            &status("bash", 1000, Some(5000)),
            "-bash\0",
        );
        fs.add_process(
            2345,
            &stat_line(2345, "postgres", 'R', 60_000, 20_000, 234_500),
            &status("postgres", 999, Some(819_200)),
            "/usr/lib/postgresql/16/bin/postgres\0-D\0/var/lib/postgresql/16/main\0-c\0config_file=/etc/postgresql/16/main/postgresql.conf\0",
        );
        fs.add_process(
            3456,
            &stat_line(3456, "worker", 'Z', 10, 5, 500_000),
            &status("worker", 4242, None),
            "",
        );

        fs
    }

    /// Creates a laptop: the typical system plus a discharging battery.
    ///
    /// BAT0 at 76%, 38 of 50 Wh stored, drawing 9.5 W, design capacity 57 Wh.
    pub fn laptop() -> Self {
        let mut fs = Self::typical_system();
        fs.add_file("/sys/class/power_supply/AC/online", "0\n");
        fs.add_file("/sys/class/power_supply/BAT0/capacity", "76\n");
        fs.add_file("/sys/class/power_supply/BAT0/status", "Discharging\n");
        fs.add_file("/sys/class/power_supply/BAT0/energy_now", "38000000\n");
        fs.add_file("/sys/class/power_supply/BAT0/energy_full", "50000000\n");
        fs.add_file("/sys/class/power_supply/BAT0/energy_full_design", "57000000\n");
        fs.add_file("/sys/class/power_supply/BAT0/power_now", "9500000\n");
        fs
    }

    /// Creates a restricted container view: only `/proc/stat`, `/proc/meminfo`
    /// and `/proc/uptime` are readable, and nothing under `/sys`.
    pub fn container() -> Self {
        let mut fs = Self::new();
        fs.add_file("/proc/uptime", "360.00 1400.00\n");
        fs.add_file(
            "/proc/meminfo",
            "MemTotal:        2048000 kB\nMemFree:          512000 kB\nMemAvailable:    1024000 kB\n",
        );
        fs.add_file(
            "/proc/stat",
            "cpu  400 0 200 3000 100 0 0 0 0 0\ncpu0 400 0 200 3000 100 0 0 0 0 0\nbtime 1700000000\n",
        );
        fs
    }
}
