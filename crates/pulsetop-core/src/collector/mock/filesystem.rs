//! In-memory mock filesystem for testing collectors without real `/proc`.
//!
//! This module provides `MockFs` which simulates the `/proc` and `/sys` trees
//! in memory, allowing tests to run on macOS and in CI environments without
//! Linux.

use crate::collector::traits::{FileSystem, FsUsage};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MockTree {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Capacity returned by `fs_stats` per mountpoint.
    capacities: HashMap<PathBuf, FsUsage>,
}

impl MockTree {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

/// In-memory filesystem for testing.
///
/// Stores files, directories and per-mountpoint capacities in memory.
/// Clones share the same tree, so a test can keep a handle and rewrite a
/// file between two collections made through another clone.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    tree: Arc<RwLock<MockTree>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> RwLockReadGuard<'_, MockTree> {
        self.tree.read().unwrap_or_else(|e| e.into_inner())
    }

    fn tree_mut(&self) -> RwLockWriteGuard<'_, MockTree> {
        self.tree.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds a file with the given content, replacing any previous content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.tree_mut();
        tree.add_parents(&path);
        tree.files.insert(path, content.into());
    }

    /// Removes a file, simulating a source that disappeared between reads.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.tree_mut().files.remove(path.as_ref());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.tree_mut();
        tree.add_parents(&path);
        tree.directories.insert(path);
    }

    /// Sets the capacity reported for the filesystem mounted at `mountpoint`.
    pub fn set_capacity(&mut self, mountpoint: impl AsRef<Path>, total: u64, free: u64) {
        self.tree_mut()
            .capacities
            .insert(mountpoint.as_ref().to_path_buf(), FsUsage { total, free });
    }

    /// Adds a process with its `/proc/[pid]/` files.
    ///
    /// # Arguments
    /// * `pid` - Process ID
    /// * `stat` - Content of `/proc/[pid]/stat`
    /// * `status` - Content of `/proc/[pid]/status`
    /// * `cmdline` - Content of `/proc/[pid]/cmdline`
    pub fn add_process(&mut self, pid: u32, stat: &str, status: &str, cmdline: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("status"), status);
        self.add_file(base.join("cmdline"), cmdline);
    }

    /// Loads a mock filesystem from a directory snapshot mounted at `virtual_root`.
    ///
    /// This is useful for regression tests with real `/proc` or `/sys` captures.
    pub fn from_snapshot(dir: &Path, virtual_root: &Path) -> io::Result<Self> {
        let mut fs = Self::new();
        mirror_dir(&mut fs, dir, virtual_root)?;
        Ok(fs)
    }
}

/// Mirrors `real` into `fs` under `virtual_dir`, skipping unreadable files.
fn mirror_dir(fs: &mut MockFs, real: &Path, virtual_dir: &Path) -> io::Result<()> {
    fs.add_dir(virtual_dir);

    for entry in std::fs::read_dir(real)? {
        let entry = entry?;
        let target = virtual_dir.join(entry.file_name());
        let kind = entry.file_type()?;

        if kind.is_dir() {
            mirror_dir(fs, &entry.path(), &target)?;
        } else if kind.is_file() {
            // sysfs attributes can be write-only or binary
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => fs.add_file(&target, content),
                Err(_) => continue,
            }
        }
    }
    Ok(())
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.tree()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no mock file {:?}", path)))
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree();
        tree.files.contains_key(path) || tree.directories.contains(path)
    }

    /// Lists direct children, files and directories alike, in path order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.tree();
        if !tree.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no mock directory {:?}", path),
            ));
        }

        let children: BTreeSet<PathBuf> = tree
            .files
            .keys()
            .chain(tree.directories.iter())
            .filter(|child| child.parent() == Some(path))
            .cloned()
            .collect();
        Ok(children.into_iter().collect())
    }

    fn fs_stats(&self, path: &Path) -> io::Result<FsUsage> {
        self.tree().capacities.get(path).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no filesystem mounted at {:?}", path),
            )
        })
    }
}
