//! Command handlers for the relaunch binary

pub mod check;
pub mod init;
pub mod restart;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relaunch::config::{Config, ConfigWarning};

/// Global flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub json: bool,
    pub verbose: u8,
    pub color: Option<relaunch::presentation::ColorWhen>,
    pub config: Option<PathBuf>,
}

pub(crate) fn project_dir() -> Result<PathBuf> {
    std::env::current_dir().context("cannot determine the current directory")
}

pub(crate) fn load_config(
    global: &GlobalArgs,
    project_dir: &Path,
) -> Result<(Config, Vec<ConfigWarning>)> {
    let loaded = Config::load_or_default(global.config.as_deref(), project_dir)?;
    Ok(loaded)
}

/// Unknown-key warnings: stderr for humans, NDJSON events with `--json`
pub(crate) fn report_warnings(command: &str, warnings: &[ConfigWarning], json: bool) {
    for warning in warnings {
        if json {
            let _ = crate::ui::json::emit(serde_json::json!({
                "event": "warning",
                "command": command,
                "kind": "unknown_config_key",
                "key": warning.key,
                "file": warning.file.display().to_string(),
                "line": warning.line,
                "suggestion": warning.suggestion,
            }));
        } else {
            eprintln!("Warning: {}", warning);
        }
    }
}
