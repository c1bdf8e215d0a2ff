//! Test doubles: in-memory filesystem, manual clock, and fixture scenarios.

mod clock;
mod filesystem;
mod scenarios;

pub use clock::{MOCK_UNIX_START, MockClock};
pub use filesystem::MockFs;
pub use scenarios::{MOCK_UPTIME_SECS, stat_line};
