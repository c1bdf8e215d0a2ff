//! Manually advanced clock for cache and rate tests.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::collector::traits::Clock;

/// Wall-clock reading `MockClock` starts at (2023-11-14T22:13:20Z).
pub const MOCK_UNIX_START: i64 = 1_700_000_000;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct MockClock {
    base: Instant,
    unix_base: i64,
    offset: Mutex<Duration>,
}

impl MockClock {
    /// Creates a clock at [`MOCK_UNIX_START`].
    pub fn new() -> Self {
        Self::with_unix_time(MOCK_UNIX_START)
    }

    /// Creates a clock whose wall-clock reading starts at `unix_secs`.
    pub fn with_unix_time(unix_secs: i64) -> Self {
        Self {
            base: Instant::now(),
            unix_base: unix_secs,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves both the monotonic and the wall clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.base + self.offset()
    }

    fn unix_time(&self) -> i64 {
        self.unix_base + self.offset().as_secs() as i64
    }
}
