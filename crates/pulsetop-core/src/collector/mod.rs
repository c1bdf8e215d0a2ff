//! System metrics collector for Linux.
//!
//! This module samples the `/proc` and `/sys` filesystems, keeps the previous
//! samples needed for deltas in a [`SampleCache`], and assembles one
//! [`SystemSnapshot`](crate::models::SystemSnapshot) per call. Every source is
//! read through the [`FileSystem`] trait so the whole pipeline runs against
//! [`MockFs`] in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         StatsCollector                           │
//! │   snapshot(): one worker per family, shared deadline             │
//! │  ┌──────┐ ┌────────┐ ┌─────────┐ ┌──────┐ ┌─────────┐            │
//! │  │ cpu  │ │ memory │ │ network │ │ disk │ │ battery │            │
//! │  └──┬───┘ └───┬────┘ └────┬────┘ └──┬───┘ └────┬────┘            │
//! │     │         │           │         │          │                 │
//! │  ┌──▼─────────▼───────────▼─────────▼──┐  ┌────▼─────────────┐   │
//! │  │           SystemReader              │  │   SysfsReader    │   │
//! │  │  - /proc/stat, cpuinfo, meminfo     │  │  - thermal/hwmon │   │
//! │  │  - /proc/net/dev, mounts, diskstats │  │  - net, battery  │   │
//! │  └──────────────────┬──────────────────┘  └────────┬─────────┘   │
//! │                     │      ┌─────────────┐         │             │
//! │                     │      │ SampleCache │ (ttl)   │             │
//! │                     │      └─────────────┘         │             │
//! │                     └──────────────┬───────────────┘             │
//! │                             ┌──────▼──────┐                      │
//! │                             │  FileSystem │ (trait)              │
//! │                             └──────┬──────┘                      │
//! └────────────────────────────────────┼─────────────────────────────┘
//!                                      │
//!                      ┌───────────────┼───────────────┐
//!                      │               │               │
//!               ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!               │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!               │ (Linux)     │ │ (Testing)   │ │ (Fixtures)  │
//!               └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use pulsetop_core::collector::{RealFs, StatsCollector};
//!
//! let collector = StatsCollector::new(RealFs::new(), "/proc", "/sys");
//! let snapshot = collector.snapshot();
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use pulsetop_core::collector::{MockFs, StatsCollector};
//!
//! let collector = StatsCollector::new(MockFs::typical_system(), "/proc", "/sys");
//! let snapshot = collector.snapshot();
//! assert_eq!(snapshot.disks.len(), 2);
//! ```

pub mod cache;
#[allow(clippy::module_inception)]
mod collector;
mod error;
pub mod mock;
pub mod procfs;
pub mod sysfs;
pub mod traits;

pub use cache::{CachedMetric, CpuUsage, MetricFamily, SampleCache};
pub use collector::{CollectorTiming, FAMILY_TIMEOUT, Family, MIN_USAGE_INTERVAL, StatsCollector};
pub use error::CollectError;
pub use mock::{MockClock, MockFs};
pub use procfs::{ProcessCollector, SystemReader, UserResolver};
pub use sysfs::{BatteryRaw, SysfsReader};
pub use traits::{Clock, FileSystem, FsUsage, RealFs, SystemClock};
