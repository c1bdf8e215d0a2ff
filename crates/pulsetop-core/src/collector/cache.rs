//! Sample cache shared by the family workers of one collector.
//!
//! Holds the previous raw samples needed for the next delta and the last
//! derived values, each with its own validity window:
//!
//! | family          | ttl  |
//! |-----------------|------|
//! | CPU model       | 24h  |
//! | CPU frequency   | 30s  |
//! | CPU temperature | 5s   |
//! | CPU usage       | 1s   |
//!
//! A family moves Empty -> Valid on its first store, Valid -> Stale when its
//! ttl elapses, and back to Valid on the next store. `clear()` returns every
//! family to Empty. Getters return the last-known value even when stale so
//! callers can fall back to it.
//!
//! All state sits behind one `RwLock`: validity checks and reads share the
//! lock, stores take it exclusively. Getters return clones, so callers never
//! hold a reference into the cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::collector::procfs::CpuAccounting;
use crate::collector::traits::Clock;

/// Metric families with an independent validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    CpuModel,
    CpuFrequency,
    CpuTemperature,
    CpuUsage,
}

impl MetricFamily {
    /// How long a stored value stays valid.
    pub const fn ttl(self) -> Duration {
        match self {
            MetricFamily::CpuModel => Duration::from_secs(24 * 60 * 60),
            MetricFamily::CpuFrequency => Duration::from_secs(30),
            MetricFamily::CpuTemperature => Duration::from_secs(5),
            MetricFamily::CpuUsage => Duration::from_secs(1),
        }
    }
}

/// A value and the instant it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMetric<T> {
    pub value: T,
    pub captured_at: Instant,
}

impl<T> CachedMetric<T> {
    pub fn new(value: T, captured_at: Instant) -> Self {
        Self { value, captured_at }
    }

    /// Time elapsed since capture. Zero if `now` precedes the capture.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.captured_at)
    }

    /// True iff `now - captured_at < ttl`.
    pub fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Derived CPU usage: overall plus per-core percentages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuUsage {
    pub overall: f64,
    pub cores: Vec<f64>,
}

impl CpuUsage {
    /// All-zero usage for `cores` cores.
    pub fn zeroed(cores: usize) -> Self {
        Self {
            overall: 0.0,
            cores: vec![0.0; cores],
        }
    }
}

/// Previous counter values for one family, keyed by device or interface name.
pub type CounterSample<K, V> = CachedMetric<HashMap<K, V>>;

#[derive(Debug, Default)]
struct CacheState {
    model: Option<CachedMetric<String>>,
    frequency: Option<CachedMetric<f64>>,
    // Inner None records a probe that found no sensor, so absent sensors are
    // not re-probed on every tick.
    temperature: Option<CachedMetric<Option<f32>>>,
    usage: Option<CachedMetric<CpuUsage>>,
    previous_sample: Option<CachedMetric<CpuAccounting>>,
    network: Option<CounterSample<String, (u64, u64)>>,
    disk: Option<CounterSample<String, (u64, u64)>>,
}

/// Cache of previous samples and derived values for one collector.
pub struct SampleCache {
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
}

impl std::fmt::Debug for SampleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleCache")
            .field("state", &*self.read())
            .finish()
    }
}

impl SampleCache {
    /// Creates an empty cache reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: RwLock::new(CacheState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("sample cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("sample cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns true if `family` holds a value younger than its ttl.
    pub fn is_valid(&self, family: MetricFamily) -> bool {
        let now = self.clock.now();
        let ttl = family.ttl();
        let state = self.read();
        match family {
            MetricFamily::CpuModel => state.model.as_ref().is_some_and(|m| m.is_valid(now, ttl)),
            MetricFamily::CpuFrequency => state
                .frequency
                .as_ref()
                .is_some_and(|m| m.is_valid(now, ttl)),
            MetricFamily::CpuTemperature => state
                .temperature
                .as_ref()
                .is_some_and(|m| m.is_valid(now, ttl)),
            MetricFamily::CpuUsage => state.usage.as_ref().is_some_and(|m| m.is_valid(now, ttl)),
        }
    }

    /// Last stored CPU model name.
    pub fn model(&self) -> Option<String> {
        self.read().model.as_ref().map(|m| m.value.clone())
    }

    pub fn set_model(&self, model: String) {
        let now = self.clock.now();
        self.write().model = Some(CachedMetric::new(model, now));
    }

    /// Last stored CPU frequency (MHz).
    pub fn frequency(&self) -> Option<f64> {
        self.read().frequency.as_ref().map(|m| m.value)
    }

    pub fn set_frequency(&self, mhz: f64) {
        let now = self.clock.now();
        self.write().frequency = Some(CachedMetric::new(mhz, now));
    }

    /// Last stored temperature. `None` if never probed or no sensor was found.
    pub fn temperature(&self) -> Option<f32> {
        self.read().temperature.as_ref().and_then(|m| m.value)
    }

    /// Stores a probe result; `None` records that no sensor is readable.
    pub fn set_temperature(&self, celsius: Option<f32>) {
        let now = self.clock.now();
        self.write().temperature = Some(CachedMetric::new(celsius, now));
    }

    /// Last derived CPU usage.
    pub fn usage(&self) -> Option<CpuUsage> {
        self.read().usage.as_ref().map(|m| m.value.clone())
    }

    pub fn set_usage(&self, usage: CpuUsage) {
        let now = self.clock.now();
        self.write().usage = Some(CachedMetric::new(usage, now));
    }

    /// Copy of the previous raw CPU accounting sample.
    pub fn previous_sample(&self) -> Option<CpuAccounting> {
        self.read().previous_sample.as_ref().map(|m| m.value.clone())
    }

    /// Time since the previous raw CPU sample was stored.
    pub fn previous_sample_age(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.read().previous_sample.as_ref().map(|m| m.age(now))
    }

    pub fn set_previous_sample(&self, sample: CpuAccounting) {
        let now = self.clock.now();
        self.write().previous_sample = Some(CachedMetric::new(sample, now));
    }

    /// Stores the current network counters (`rx_bytes`, `tx_bytes` per
    /// interface) and returns the previous ones.
    pub fn swap_network_sample(
        &self,
        current: HashMap<String, (u64, u64)>,
    ) -> Option<CounterSample<String, (u64, u64)>> {
        let sample = CachedMetric::new(current, self.clock.now());
        self.write().network.replace(sample)
    }

    /// Stores the current disk counters (`read_bytes`, `write_bytes` per
    /// device) and returns the previous ones.
    pub fn swap_disk_sample(
        &self,
        current: HashMap<String, (u64, u64)>,
    ) -> Option<CounterSample<String, (u64, u64)>> {
        let sample = CachedMetric::new(current, self.clock.now());
        self.write().disk.replace(sample)
    }

    /// Drops every cached value and previous sample.
    pub fn clear(&self) {
        *self.write() = CacheState::default();
    }
}

/// Per-key counter rates between a previous sample and the current values.
///
/// Keys absent from the previous sample, or whose counters regressed, get no
/// entry.
pub fn counter_rates<K: Eq + Hash + Clone>(
    previous: &CounterSample<K, (u64, u64)>,
    current: &HashMap<K, (u64, u64)>,
    now: Instant,
) -> HashMap<K, (f64, f64)> {
    let elapsed = previous.age(now).as_secs_f64();
    current
        .iter()
        .filter_map(|(key, &(a, b))| {
            let &(prev_a, prev_b) = previous.value.get(key)?;
            let rate_a = crate::rates::counter_rate(prev_a, a, elapsed)?;
            let rate_b = crate::rates::counter_rate(prev_b, b, elapsed)?;
            Some((key.clone(), (rate_a, rate_b)))
        })
        .collect()
}
