//! pulsetop-core: OS metrics sampling and derived-metrics engine.
//!
//! Provides:
//! - `collector`: raw `/proc` and `/sys` readers, the sample cache and the
//!   fan-out `StatsCollector`
//! - `rates`: pure calculators for percentages and per-second rates
//! - `models`: serializable snapshot and process types
//! - `fmt`: shared formatting helpers (bytes, rates, durations)
//! - `util`: helper utilities

pub mod collector;
pub mod fmt;
pub mod models;
pub mod rates;
pub mod util;
