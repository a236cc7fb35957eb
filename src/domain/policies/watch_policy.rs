//! Watch Policy
//!
//! Decides whether a raw change event is even a candidate for a restart:
//! directories never are, files need a recognized extension, and anything
//! under a compiled-artifact cache is ignored.

use std::path::{Component, Path};

use crate::domain::value_objects::ChangeEvent;

/// Outcome of running a change event through the static filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Path may trigger a restart
    Eligible,
    /// Event refers to a directory
    Directory,
    /// Extension is not one we watch
    Extension,
    /// Path matched an excluded marker
    Excluded(String),
}

impl FilterVerdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, FilterVerdict::Eligible)
    }

    /// Short reason used in log lines and NDJSON output
    pub fn reason(&self) -> String {
        match self {
            FilterVerdict::Eligible => "eligible".to_string(),
            FilterVerdict::Directory => "directory".to_string(),
            FilterVerdict::Extension => "extension".to_string(),
            FilterVerdict::Excluded(marker) => format!("excluded:{}", marker),
        }
    }
}

/// Which paths are worth a restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPolicy {
    extensions: Vec<String>,
    exclude: Vec<String>,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self::new(["py", "css"], ["__pycache__", ".pyc"])
    }
}

impl WatchPolicy {
    /// Extensions are matched case-insensitively and may be given with or
    /// without a leading dot.
    pub fn new<E, X>(extensions: E, exclude: X) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        X: IntoIterator,
        X::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            exclude: exclude
                .into_iter()
                .map(|x| x.as_ref().to_string())
                .filter(|x| !x.is_empty())
                .collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Apply the directory, extension and exclusion rules, in that order
    pub fn evaluate(&self, event: &ChangeEvent) -> FilterVerdict {
        if event.is_directory {
            return FilterVerdict::Directory;
        }
        if !self.has_watched_extension(&event.path) {
            return FilterVerdict::Extension;
        }
        if let Some(marker) = self.excluded_marker(&event.path) {
            return FilterVerdict::Excluded(marker.to_string());
        }
        FilterVerdict::Eligible
    }

    fn has_watched_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    /// A marker matches a whole path segment (`__pycache__`) or, when it
    /// starts with a dot, a file-name suffix (`.pyc`).
    fn excluded_marker(&self, path: &Path) -> Option<&str> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.exclude
            .iter()
            .find(|marker| {
                let in_segment = path.components().any(|c| match c {
                    Component::Normal(seg) => seg.to_string_lossy() == marker.as_str(),
                    _ => false,
                });
                in_segment || (marker.starts_with('.') && file_name.ends_with(marker.as_str()))
            })
            .map(String::as_str)
    }
}
