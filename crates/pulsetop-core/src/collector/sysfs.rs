//! Raw readers for `/sys/class` sensors: thermal zones, hwmon, network links
//! and power supplies.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::error::CollectError;
use crate::collector::procfs::parser::{parse_link_speed, parse_temperature};
use crate::collector::procfs::soft;
use crate::collector::traits::FileSystem;

/// Raw battery attributes from `/sys/class/power_supply/BAT*`.
///
/// Energy values are µWh with power in µW; batteries that expose `charge_*`
/// report µAh with current in µA instead. All four values come from the same
/// family, so the ratio of stored to drawn is a duration in hours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatteryRaw {
    /// Charge level in percent.
    pub capacity: Option<u8>,
    /// `Charging`, `Discharging`, `Full`, `Not charging` or `Unknown`.
    pub status: Option<String>,
    pub energy_now: Option<u64>,
    pub energy_full: Option<u64>,
    pub energy_full_design: Option<u64>,
    pub power_now: Option<u64>,
}

/// Reads sensors and device attributes under `/sys/`.
#[derive(Debug, Clone)]
pub struct SysfsReader<F: FileSystem> {
    fs: F,
    sys_path: String,
}

impl<F: FileSystem> SysfsReader<F> {
    /// Creates a new sysfs reader rooted at `sys_path` (usually "/sys").
    pub fn new(fs: F, sys_path: impl Into<String>) -> Self {
        Self {
            fs,
            sys_path: sys_path.into(),
        }
    }

    fn path(&self, rel: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", self.sys_path, rel))
    }

    fn read_trimmed(&self, path: &Path) -> Option<String> {
        self.fs
            .read_to_string(path)
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn read_u64(&self, path: &Path) -> Option<u64> {
        self.read_trimmed(path)?.parse().ok()
    }

    /// Lists children of `dir` whose file name matches `prefix*suffix`, sorted.
    fn glob_children(&self, dir: &Path, prefix: &str, suffix: &str) -> Vec<PathBuf> {
        let mut matches: Vec<PathBuf> = self
            .fs
            .read_dir(dir)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix) && n.ends_with(suffix))
            })
            .collect();
        matches.sort();
        matches
    }

    /// Candidate temperature inputs in probe order.
    ///
    /// Fixed well-known paths come first, then every `hwmon*/temp*_input` and
    /// every coretemp hwmon input.
    fn temperature_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![
            self.path("class/thermal/thermal_zone0/temp"),
            self.path("class/hwmon/hwmon0/temp1_input"),
            self.path("class/hwmon/hwmon1/temp1_input"),
            self.path("class/hwmon/hwmon2/temp1_input"),
        ];

        for hwmon in self.glob_children(&self.path("class/hwmon"), "hwmon", "") {
            candidates.extend(self.glob_children(&hwmon, "temp", "_input"));
        }

        for coretemp in self.glob_children(&self.path("devices/platform"), "coretemp.", "") {
            for hwmon in self.glob_children(&coretemp.join("hwmon"), "hwmon", "") {
                candidates.extend(self.glob_children(&hwmon, "temp", "_input"));
            }
        }

        candidates
    }

    /// Reads the first valid CPU temperature in degrees Celsius.
    pub fn read_temperature(&self) -> Option<f32> {
        for path in self.temperature_candidates() {
            let Ok(content) = self.fs.read_to_string(&path) else {
                continue;
            };
            match parse_temperature(&content) {
                Ok(celsius) => return Some(celsius),
                Err(e) => debug!(path = %path.display(), error = %e, "rejected temperature"),
            }
        }
        soft("temperature", Err(CollectError::Unavailable("temperature sensor")))
    }

    /// Reads `/sys/class/net/<name>/operstate`.
    pub fn read_interface_status(&self, name: &str) -> Option<String> {
        self.read_trimmed(&self.path(&format!("class/net/{}/operstate", name)))
            .filter(|s| !s.is_empty())
    }

    /// Reads `/sys/class/net/<name>/speed` formatted as `"<n> Mb/s"`.
    pub fn read_interface_speed(&self, name: &str) -> Option<String> {
        let content = self
            .fs
            .read_to_string(&self.path(&format!("class/net/{}/speed", name)))
            .ok()?;
        parse_link_speed(&content)
    }

    /// Reads the first battery (`BAT*` in name order) from `power_supply`.
    pub fn read_battery(&self) -> Option<BatteryRaw> {
        let dir = self
            .glob_children(&self.path("class/power_supply"), "BAT", "")
            .into_iter()
            .next();
        let Some(dir) = dir else {
            return soft("battery", Err(CollectError::Unavailable("battery")));
        };

        let attr = |name: &str| dir.join(name);
        let (stored, draw) = if self.fs.exists(&attr("energy_now")) {
            ("energy", "power_now")
        } else {
            ("charge", "current_now")
        };
        let stored_attr = |suffix: &str| self.read_u64(&attr(&format!("{}_{}", stored, suffix)));

        Some(BatteryRaw {
            capacity: self
                .read_u64(&attr("capacity"))
                .map(|c| c.min(100) as u8),
            status: self.read_trimmed(&attr("status")),
            energy_now: stored_attr("now"),
            energy_full: stored_attr("full"),
            energy_full_design: stored_attr("full_design"),
            power_now: self.read_u64(&attr(draw)),
        })
    }
}
