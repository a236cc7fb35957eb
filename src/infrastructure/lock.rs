//! Single-instance lock
//!
//! One supervisor per port. The lock is an advisory `fs2` lock on a file in
//! the temp directory and is released when the guard drops (or the process
//! dies).

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{RelaunchError, RelaunchResult};

/// Held for as long as the supervisor runs
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Lock file path for `port` under the system temp directory
    pub fn default_path(port: u16) -> PathBuf {
        std::env::temp_dir().join(format!("relaunch-{}.lock", port))
    }

    pub fn acquire(port: u16) -> RelaunchResult<Self> {
        Self::acquire_at(port, &Self::default_path(port))
    }

    pub fn acquire_at(port: u16, path: &Path) -> RelaunchResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(RelaunchError::AlreadyRunning {
                port,
                lock: path.to_path_buf(),
            });
        }

        tracing::debug!("acquired instance lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
