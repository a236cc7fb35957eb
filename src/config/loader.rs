//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RelaunchError, RelaunchResult};

use super::env_validator::{levenshtein, EnvVarValidator};
use super::types::{ColorMode, Config, Verbosity};

/// Project config file name, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "relaunch.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> RelaunchResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| RelaunchError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// First config found wins: `explicit`, `<project>/relaunch.toml`, the user
/// config, then built-in defaults. Environment overrides go on top.
///
/// A missing or broken `explicit` file is an error; a broken project or user
/// file is too, since silently running with defaults would launch the wrong
/// command.
pub fn load_or_default(
    explicit: Option<&Path>,
    project_dir: &Path,
) -> RelaunchResult<(Config, Vec<ConfigWarning>)> {
    match config_source(explicit, project_dir) {
        Some(path) => {
            let (config, warnings) = load_with_warnings(&path)?;
            Ok((with_env_overrides(config), warnings))
        }
        None => Ok((with_env_overrides(Config::default()), Vec::new())),
    }
}

/// The file `load_or_default` reads: the explicit path (even if missing),
/// else the project file, else the user file. `None` means defaults.
pub fn config_source(explicit: Option<&Path>, project_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let project_config = project_dir.join(PROJECT_CONFIG_FILE);
    if project_config.exists() {
        return Some(project_config);
    }
    user_config_path().filter(|path| path.exists())
}

/// Apply environment variable overrides (RELAUNCH_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_env_overrides(config, |name| std::env::var(name).ok(), &mut std::io::stderr())
}

pub(crate) fn apply_env_overrides<F, W>(mut config: Config, lookup: F, writer: &mut W) -> Config
where
    F: Fn(&str) -> Option<String>,
    W: std::io::Write,
{
    // RELAUNCH_PORT
    if let Some(value) = lookup("RELAUNCH_PORT") {
        config.server.port = EnvVarValidator::new("RELAUNCH_PORT", &["1-65535"]).parse_with_writer(
            &value,
            |s| s.trim().parse::<u16>().ok().filter(|p| *p > 0),
            config.server.port,
            writer,
        );
    }

    // RELAUNCH_DEBOUNCE_MS
    if let Some(value) = lookup("RELAUNCH_DEBOUNCE_MS") {
        config.watch.debounce_ms = EnvVarValidator::new("RELAUNCH_DEBOUNCE_MS", &["<milliseconds>"])
            .parse_with_writer(
                &value,
                |s| s.trim().parse::<u64>().ok(),
                config.watch.debounce_ms,
                writer,
            );
    }

    // RELAUNCH_MAX_ATTEMPTS
    if let Some(value) = lookup("RELAUNCH_MAX_ATTEMPTS") {
        config.restart.max_attempts = EnvVarValidator::new("RELAUNCH_MAX_ATTEMPTS", &["1.."])
            .parse_with_writer(
                &value,
                |s| s.trim().parse::<u32>().ok().filter(|n| *n > 0),
                config.restart.max_attempts,
                writer,
            );
    }

    // RELAUNCH_VERBOSITY
    if let Some(value) = lookup("RELAUNCH_VERBOSITY") {
        config.output.verbosity = EnvVarValidator::new(
            "RELAUNCH_VERBOSITY",
            &["quiet", "normal", "verbose", "debug"],
        )
        .parse_with_writer(
            &value,
            |s| match s.to_lowercase().as_str() {
                "quiet" => Some(Verbosity::Quiet),
                "normal" => Some(Verbosity::Normal),
                "verbose" => Some(Verbosity::Verbose),
                "debug" => Some(Verbosity::Debug),
                _ => None,
            },
            config.output.verbosity,
            writer,
        );
    }

    // RELAUNCH_COLOR
    if let Some(value) = lookup("RELAUNCH_COLOR") {
        config.output.color = EnvVarValidator::new("RELAUNCH_COLOR", &["auto", "always", "never"])
            .parse_with_writer(
                &value,
                |s| match s.to_lowercase().as_str() {
                    "auto" => Some(ColorMode::Auto),
                    "always" => Some(ColorMode::Always),
                    "never" => Some(ColorMode::Never),
                    _ => None,
                },
                config.output.color,
                writer,
            );
    }

    config
}

/// `~/.config/relaunch/config.toml` (XDG_CONFIG_HOME honoured)
pub fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|dir| dir.join("relaunch/config.toml"))
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "server",
        "command",
        "working_dir",
        "port",
        "env",
        "startup_grace_ms",
        "probe_port",
        "reclaim_port",
        "required_files",
        "watch",
        "roots",
        "extensions",
        "exclude",
        "debounce_ms",
        "queue_capacity",
        "restart",
        "terminate_timeout_ms",
        "settle_ms",
        "max_attempts",
        "backoff",
        "backoff_ms",
        "max_backoff_ms",
        "output",
        "verbosity",
        "color",
        "prefix_server_output",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}
