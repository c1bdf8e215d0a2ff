//! Readers for the Linux `/proc` filesystem.
//!
//! This module provides the pure parsers, the system-wide raw readers, and
//! the per-process collector.

pub mod parser;
pub mod process;
pub mod system;

use tracing::debug;

use crate::collector::error::CollectError;

pub use parser::{
    CpuAccounting, CpuIdentity, CpuTimes, DiskIo, InterfaceCounters, MemInfo, MountEntry,
    ParseError, UserResolver,
};
pub use process::ProcessCollector;
pub use system::SystemReader;

/// Converts a collection result into the fail-soft `Option` returned by readers.
pub(crate) fn soft<T>(source: &'static str, result: Result<T, CollectError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(source, error = %e, "source unavailable");
            None
        }
    }
}
