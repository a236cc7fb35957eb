//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::supervise::SupervisorOptions;
use crate::domain::policies::{Backoff, RetryPolicy, WatchPolicy};
use crate::domain::ports::{LaunchSpec, OutputMode};
use crate::domain::value_objects::WatchRoot;
use crate::error::{RelaunchError, RelaunchResult};

use super::loader::{self, ConfigWarning};

/// Server command line.
///
/// Accepts both a plain string (split on whitespace):
///   command = "python demo_dev.py"
///
/// And an explicit argv array:
///   command = ["python", "demo_dev.py", "--share"]
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CommandLine(pub Vec<String>);

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandLineDe {
    Line(String),
    Argv(Vec<String>),
}

impl<'de> Deserialize<'de> for CommandLine {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match CommandLineDe::deserialize(deserializer)? {
            CommandLineDe::Line(line) => Ok(Self(
                line.split_whitespace().map(str::to_string).collect(),
            )),
            CommandLineDe::Argv(argv) => Ok(Self(argv)),
        }
    }
}

impl CommandLine {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Program name, if any
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub command: CommandLine,

    /// Directory the server runs in (relative paths resolve against the project directory)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default = "default_startup_grace_ms")]
    pub startup_grace_ms: u64,

    #[serde(default)]
    pub probe_port: bool,

    #[serde(default)]
    pub reclaim_port: bool,

    /// Files `relaunch check` requires before starting
    #[serde(default)]
    pub required_files: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: CommandLine::default(),
            working_dir: None,
            port: default_port(),
            env: BTreeMap::new(),
            startup_grace_ms: default_startup_grace_ms(),
            probe_port: false,
            reclaim_port: false,
            required_files: Vec::new(),
        }
    }
}

fn default_port() -> u16 {
    7861
}

fn default_startup_grace_ms() -> u64 {
    3000
}

/// Watch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            extensions: default_extensions(),
            exclude: default_exclude(),
            debounce_ms: default_debounce_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string(), "css".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["__pycache__".to_string(), ".pyc".to_string()]
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    1024
}

/// Backoff strategy between launch attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Restart configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartConfig {
    #[serde(default = "default_terminate_timeout_ms")]
    pub terminate_timeout_ms: u64,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub backoff: BackoffKind,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            terminate_timeout_ms: default_terminate_timeout_ms(),
            settle_ms: default_settle_ms(),
            max_attempts: default_max_attempts(),
            backoff: BackoffKind::default(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RestartConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.backoff_ms);
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed(initial),
            BackoffKind::Exponential => Backoff::Exponential {
                initial,
                max: Duration::from_millis(self.max_backoff_ms.max(self.backoff_ms)),
            },
        };
        RetryPolicy::new(self.max_attempts, backoff)
    }
}

fn default_terminate_timeout_ms() -> u64 {
    5000
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    3000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub verbosity: Verbosity,

    #[serde(default)]
    pub color: ColorMode,

    /// Relay server output as `[server] <line>` (otherwise inherit the terminal)
    #[serde(default = "default_true")]
    pub prefix_server_output: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            color: ColorMode::default(),
            prefix_server_output: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub restart: RestartConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> RelaunchResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> RelaunchResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Explicit file, project file, user file or defaults; env overrides applied
    pub fn load_or_default(
        explicit: Option<&Path>,
        project_dir: &Path,
    ) -> RelaunchResult<(Self, Vec<ConfigWarning>)> {
        loader::load_or_default(explicit, project_dir)
    }

    /// Apply environment variable overrides (RELAUNCH_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// Command line and port as a launch spec. Fails with `MissingCommand`
    /// when no command is configured.
    pub fn launch_spec(&self, project_dir: &Path) -> RelaunchResult<LaunchSpec> {
        let working_dir = match &self.server.working_dir {
            Some(dir) => project_dir.join(dir),
            None => project_dir.to_path_buf(),
        };
        let output = if self.output.prefix_server_output {
            OutputMode::Prefixed
        } else {
            OutputMode::Inherit
        };
        LaunchSpec::from_argv(&self.server.command.0, working_dir, self.server.port)
            .map(|spec| spec.with_env(self.server.env.clone()).with_output(output))
            .ok_or(RelaunchError::MissingCommand)
    }

    pub fn watch_policy(&self) -> WatchPolicy {
        WatchPolicy::new(self.watch.extensions.iter(), self.watch.exclude.iter())
    }

    pub fn watch_roots(&self, project_dir: &Path) -> Vec<WatchRoot> {
        self.watch
            .roots
            .iter()
            .map(|root| WatchRoot::new(project_dir.join(root)))
            .collect()
    }

    /// Everything the supervisor needs, with paths resolved against `project_dir`
    pub fn supervisor_options(&self, project_dir: &Path) -> RelaunchResult<SupervisorOptions> {
        let restart = &self.restart;
        Ok(SupervisorOptions::new(self.launch_spec(project_dir)?)
            .with_roots(self.watch_roots(project_dir))
            .with_policy(self.watch_policy())
            .with_debounce(Duration::from_millis(self.watch.debounce_ms))
            .with_startup_grace(Duration::from_millis(self.server.startup_grace_ms))
            .with_terminate_timeout(Duration::from_millis(restart.terminate_timeout_ms))
            .with_settle(Duration::from_millis(restart.settle_ms))
            .with_retry(restart.retry_policy())
            .with_probe_port(self.server.probe_port)
            .with_reclaim_port(self.server.reclaim_port)
            .with_queue_capacity(self.watch.queue_capacity))
    }
}
