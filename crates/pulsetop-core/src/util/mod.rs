//! Utility modules.

pub mod math;

pub use math::{clamp_percent, percent_of};
