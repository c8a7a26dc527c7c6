//! Error types for the watcher core

use std::fmt;
use std::path::PathBuf;

/// Configuration-fatal error: the initial watched directory is not a package.
#[derive(Debug)]
pub struct DirNoPackage {
    pub dir: PathBuf,
}

impl fmt::Display for DirNoPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a package", self.dir.display())
    }
}

impl std::error::Error for DirNoPackage {}

/// Driver-fatal error: the worker pool could not be built.
#[derive(Debug)]
pub struct PoolInitError {
    pub reason: String,
}

impl fmt::Display for PoolInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to initialize worker pool: {}", self.reason)
    }
}

impl std::error::Error for PoolInitError {}
