//! Abstractions for filesystem and clock access to enable testing and mocking.
//!
//! The `FileSystem` trait allows the collectors to work with both the real
//! `/proc` and `/sys` trees on Linux and in-memory fixtures in tests. The
//! `Clock` trait does the same for time, so cache validity windows can be
//! exercised without sleeping.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Capacity of a mounted filesystem, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsUsage {
    /// Total size (`f_blocks * f_frsize`).
    pub total: u64,
    /// Space available to unprivileged users (`f_bavail * f_frsize`).
    pub free: u64,
}

/// Abstraction for filesystem operations.
///
/// This trait allows collectors to read from the real filesystem or from
/// a mock implementation for testing purposes.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents as a string, or an I/O error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Queries capacity of the filesystem mounted at `path`.
    fn fs_stats(&self, path: &Path) -> io::Result<FsUsage>;
}

/// Real filesystem implementation that delegates to `std::fs` and `statvfs(3)`.
///
/// Use this in production to read from the actual `/proc` and `/sys` trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    #[cfg(target_os = "linux")]
    #[allow(clippy::unnecessary_cast)]
    fn fs_stats(&self, path: &Path) -> io::Result<FsUsage> {
        use std::ffi::CString;
        use std::mem::MaybeUninit;
        use std::os::unix::ffi::OsStrExt;

        let path_cstr = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut stat = MaybeUninit::<libc::statvfs>::uninit();

        // SAFETY: statvfs is a POSIX syscall that initializes the stat buffer
        // on success; the buffer is only read after a zero return code.
        #[allow(unsafe_code)]
        let stat = unsafe {
            if libc::statvfs(path_cstr.as_ptr(), stat.as_mut_ptr()) != 0 {
                return Err(io::Error::last_os_error());
            }
            stat.assume_init()
        };

        let block_size = stat.f_frsize as u64;
        Ok(FsUsage {
            total: (stat.f_blocks as u64).saturating_mul(block_size),
            free: (stat.f_bavail as u64).saturating_mul(block_size),
        })
    }

    #[cfg(not(target_os = "linux"))]
    fn fs_stats(&self, path: &Path) -> io::Result<FsUsage> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("statvfs not supported for {:?} on this platform", path),
        ))
    }
}

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic instant, used for cache validity and rate windows.
    fn now(&self) -> Instant;

    /// Seconds since the Unix epoch.
    fn unix_time(&self) -> i64;
}

/// Production clock backed by `Instant::now()` and `chrono::Utc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_time(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_real_fs_read_to_string() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MemTotal: 16384 kB").unwrap();

        let fs = RealFs::new();
        let content = fs.read_to_string(file.path()).unwrap();
        assert!(content.contains("MemTotal"));
    }

    #[test]
    fn test_real_fs_exists() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        assert!(fs.exists(dir.path()));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("temp1_input"), "45000\n").unwrap();
        std::fs::write(dir.path().join("temp2_input"), "47000\n").unwrap();

        let fs = RealFs::new();
        let entries = fs.read_dir(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_real_fs_stats_on_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        let usage = fs.fs_stats(dir.path()).unwrap();
        assert!(usage.total > 0);
        assert!(usage.free <= usage.total);
    }

    #[test]
    fn test_real_fs_stats_missing_path() {
        let fs = RealFs::new();
        assert!(fs.fs_stats(Path::new("/nonexistent/path/12345")).is_err());
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(clock.unix_time() > 1_600_000_000);
    }
}
