//! Error type for collection failures.
//!
//! Errors never escape a snapshot: readers log them at debug level and hand
//! the caller `None`. They exist so the reason a source was unavailable is
//! recorded somewhere.

use std::io;

use thiserror::Error;

use crate::collector::procfs::ParseError;

#[derive(Debug, Error)]
pub enum CollectError {
    /// Process disappeared during collection.
    #[error("process {0} disappeared")]
    ProcessGone(u32),

    /// I/O error reading a source file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Source file exists but its content is not in the expected format.
    #[error("malformed {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    /// No candidate source exists on this system (no battery, no sensor).
    #[error("{0} is not available on this system")]
    Unavailable(&'static str),
}

impl CollectError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        CollectError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<String>, source: ParseError) -> Self {
        CollectError::Parse {
            path: path.into(),
            source,
        }
    }
}
