/*!
 * Capsule Store
 * Read-only access to capsule files, from disk or in-memory fixtures
 *
 * Nothing is cached: every lookup is a fresh read, so operators can edit a
 * capsule while the gateway is running.
 */

use crate::core::errors::{CapsuleError, CapsuleResult};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Source of capsule configuration and content
pub trait CapsuleStore: Send + Sync {
    /// Read an entire file as UTF-8
    fn read_to_string(&self, path: &Path) -> CapsuleResult<String>;

    /// Check whether a regular file exists
    fn is_file(&self, path: &Path) -> bool;

    /// Read a file as lines, dropping carriage returns
    fn read_lines(&self, path: &Path) -> CapsuleResult<Vec<String>> {
        Ok(self
            .read_to_string(path)?
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect())
    }
}

/// Store backed by the host filesystem
#[derive(Debug, Clone, Default)]
pub struct FsCapsuleStore;

impl FsCapsuleStore {
    pub fn new() -> Self {
        Self
    }
}

impl CapsuleStore for FsCapsuleStore {
    fn read_to_string(&self, path: &Path) -> CapsuleResult<String> {
        fs::read_to_string(path).map_err(|e| CapsuleError::from_io(path.to_path_buf(), e))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory store for deterministic tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCapsuleStore {
    files: HashMap<PathBuf, String>,
    unreadable: HashSet<PathBuf>,
}

impl MemoryCapsuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<P: Into<PathBuf>, S: Into<String>>(mut self, path: P, contents: S) -> Self {
        self.insert(path, contents);
        self
    }

    /// Register a path that exists but fails to read
    pub fn with_unreadable<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    pub fn insert<P: Into<PathBuf>, S: Into<String>>(&mut self, path: P, contents: S) {
        self.files.insert(path.into(), contents.into());
    }
}

impl CapsuleStore for MemoryCapsuleStore {
    fn read_to_string(&self, path: &Path) -> CapsuleResult<String> {
        if self.unreadable.contains(path) {
            return Err(CapsuleError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "unreadable"),
            });
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| CapsuleError::NotFound(path.to_path_buf()))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}
