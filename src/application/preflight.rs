//! Preflight Use Case
//!
//! Checks that a `run` would get off the ground: the command resolves,
//! required files and watch roots exist, and the port is available.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{Config, ConfigWarning};

/// Result of a single preflight check
#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    /// Area being checked ("command", "files", "watch", "port", "config")
    pub category: String,
    /// Name of the check
    pub name: String,
    pub status: CheckStatus,
    /// Human-readable message
    pub message: String,
    /// How to fix it
    pub recommendation: Option<String>,
}

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

/// Result of the preflight run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub items: Vec<CheckItem>,
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl CheckResult {
    /// No errors (warnings allowed)
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.warnings == 0
    }

    fn push(&mut self, item: CheckItem) {
        match item.status {
            CheckStatus::Pass => self.passed += 1,
            CheckStatus::Warning => self.warnings += 1,
            CheckStatus::Error => self.errors += 1,
        }
        self.items.push(item);
    }
}

/// Preflight Use Case
pub struct CheckUseCase<'a> {
    config: &'a Config,
    project_dir: &'a Path,
    port_is_free: Box<dyn Fn(u16) -> bool + 'a>,
}

impl<'a> CheckUseCase<'a> {
    /// `port_is_free` decides the port check (the binary passes a real TCP bind probe)
    pub fn new<P>(config: &'a Config, project_dir: &'a Path, port_is_free: P) -> Self
    where
        P: Fn(u16) -> bool + 'a,
    {
        Self {
            config,
            project_dir,
            port_is_free: Box::new(port_is_free),
        }
    }

    pub fn execute(&self, warnings: &[ConfigWarning]) -> CheckResult {
        self.execute_with_callback(warnings, |_| {})
    }

    /// Execute with a callback for each check (for streaming UI)
    pub fn execute_with_callback<F>(&self, warnings: &[ConfigWarning], mut on_check: F) -> CheckResult
    where
        F: FnMut(&CheckItem),
    {
        let mut result = CheckResult::default();
        let mut record = |item: CheckItem| {
            on_check(&item);
            result.push(item);
        };

        for warning in warnings {
            record(item(
                "config",
                "unknown_key",
                CheckStatus::Warning,
                warning.to_string(),
                Some("remove or rename the key".to_string()),
            ));
        }

        let working_dir = self.working_dir();
        for check in self.command_checks(&working_dir) {
            record(check);
        }
        for check in self.file_checks(&working_dir) {
            record(check);
        }
        for check in self.watch_checks() {
            record(check);
        }
        record(self.port_check());

        result
    }

    fn working_dir(&self) -> PathBuf {
        match &self.config.server.working_dir {
            Some(dir) => self.project_dir.join(dir),
            None => self.project_dir.to_path_buf(),
        }
    }

    fn command_checks(&self, working_dir: &Path) -> Vec<CheckItem> {
        let mut items = Vec::new();

        if !working_dir.is_dir() {
            items.push(item(
                "command",
                "working_dir",
                CheckStatus::Error,
                format!("working directory {} does not exist", working_dir.display()),
                Some("fix [server].working_dir".to_string()),
            ));
        }

        let Some(program) = self.config.server.command.program() else {
            items.push(item(
                "command",
                "configured",
                CheckStatus::Error,
                "no server command configured".to_string(),
                Some("set [server].command or pass one after `--`".to_string()),
            ));
            return items;
        };

        match resolve_program(program, working_dir) {
            Some(path) => items.push(item(
                "command",
                "resolvable",
                CheckStatus::Pass,
                format!("{} -> {}", program, path.display()),
                None,
            )),
            None => items.push(item(
                "command",
                "resolvable",
                CheckStatus::Error,
                format!("`{}` not found on PATH or in {}", program, working_dir.display()),
                Some("install it or use an absolute path".to_string()),
            )),
        }
        items
    }

    fn file_checks(&self, working_dir: &Path) -> Vec<CheckItem> {
        self.config
            .server
            .required_files
            .iter()
            .map(|file| {
                let path = working_dir.join(file);
                if path.exists() {
                    item(
                        "files",
                        "required",
                        CheckStatus::Pass,
                        format!("{} found", file.display()),
                        None,
                    )
                } else {
                    item(
                        "files",
                        "required",
                        CheckStatus::Error,
                        format!("{} is missing", path.display()),
                        None,
                    )
                }
            })
            .collect()
    }

    fn watch_checks(&self) -> Vec<CheckItem> {
        let roots = self.config.watch_roots(self.project_dir);
        if roots.is_empty() {
            return vec![item(
                "watch",
                "roots",
                CheckStatus::Warning,
                "no watch roots configured; changes will not restart the server".to_string(),
                Some("set [watch].roots".to_string()),
            )];
        }
        roots
            .iter()
            .map(|root| {
                if root.exists() {
                    item(
                        "watch",
                        "root",
                        CheckStatus::Pass,
                        format!("watching {}", root),
                        None,
                    )
                } else {
                    item(
                        "watch",
                        "root",
                        CheckStatus::Error,
                        format!("watch root {} is not a directory", root),
                        None,
                    )
                }
            })
            .collect()
    }

    fn port_check(&self) -> CheckItem {
        let port = self.config.server.port;
        if (self.port_is_free)(port) {
            return item(
                "port",
                "free",
                CheckStatus::Pass,
                format!("port {} is free", port),
                None,
            );
        }
        if self.config.server.reclaim_port {
            item(
                "port",
                "free",
                CheckStatus::Warning,
                format!("port {} is in use; it will be reclaimed before launch", port),
                None,
            )
        } else {
            item(
                "port",
                "free",
                CheckStatus::Error,
                format!("port {} is already in use", port),
                Some("stop the other server or set [server].reclaim_port = true".to_string()),
            )
        }
    }
}

fn item(
    category: &str,
    name: &str,
    status: CheckStatus,
    message: String,
    recommendation: Option<String>,
) -> CheckItem {
    CheckItem {
        category: category.to_string(),
        name: name.to_string(),
        status,
        message,
        recommendation,
    }
}

/// Locate `program` the way a spawn would: paths containing a separator are
/// taken relative to `working_dir`, bare names are searched on PATH.
pub fn resolve_program(program: &str, working_dir: &Path) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 || as_path.is_absolute() {
        let candidate = working_dir.join(as_path);
        return candidate.is_file().then_some(candidate);
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| executable_candidates(&dir, program))
        .find(|candidate| candidate.is_file())
}

#[cfg(windows)]
fn executable_candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    ["", ".exe", ".cmd", ".bat"]
        .iter()
        .map(|ext| dir.join(format!("{}{}", program, ext)))
        .collect()
}

#[cfg(not(windows))]
fn executable_candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}
