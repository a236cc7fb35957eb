//! Change value objects - what the change source reports
//!
//! A `ChangeEvent` is produced once by the change source, inspected once by
//! the supervisor's filter, and then discarded.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

/// Kind of file-system change the supervisor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Content or metadata of an existing path changed
    Modified,
    /// A new path appeared
    Created,
    /// A path was renamed or moved into place
    Moved,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Moved => write!(f, "moved"),
        }
    }
}

/// A single observed file-system notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub is_directory: bool,
    pub timestamp: Instant,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind, timestamp: Instant) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory: false,
            timestamp,
        }
    }

    /// Shorthand for a file modification observed right now
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Modified, Instant::now())
    }

    pub fn directory(mut self) -> Self {
        self.is_directory = true;
        self
    }

    /// File name for compact log lines, falling back to the full path
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A directory watched recursively for the supervisor's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchRoot(PathBuf);

impl WatchRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn exists(&self) -> bool {
        self.0.is_dir()
    }
}

impl std::fmt::Display for WatchRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
