//! Error types for relaunch
//!
//! Every child-process or watcher failure is converted into one of these
//! kinds at the supervisor boundary; raw platform errors never escape.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for relaunch operations
pub type RelaunchResult<T> = Result<T, RelaunchError>;

/// Main error type for relaunch operations
#[derive(Error, Debug)]
pub enum RelaunchError {
    /// Process failed to spawn, exited inside the startup grace window,
    /// or never started listening on its port
    #[error("launch failed: {reason}")]
    LaunchFailure { reason: String },

    /// Graceful termination did not complete in time (escalated to a kill)
    #[error("process {pid} did not exit within {timeout_ms}ms of the terminate signal")]
    TerminationTimeout { pid: u32, timeout_ms: u64 },

    /// Initial launch exhausted its retry budget
    #[error("startup abandoned after {attempts} failed launch attempts")]
    StartupAbandoned { attempts: u32 },

    /// A restart exhausted its retry budget
    #[error("restart abandoned after {attempts} failed launch attempts")]
    RestartAbandoned { attempts: u32 },

    /// The change-notification mechanism failed
    #[error("watch source error: {message}")]
    WatchSource { message: String },

    /// Invalid configuration file
    #[error("invalid config in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// No command configured to launch
    #[error("no server command configured (set [server].command or pass one after `--`)")]
    MissingCommand,

    /// Another supervisor already owns this port
    #[error("another relaunch supervisor already owns port {port} (lock: {lock})")]
    AlreadyRunning { port: u16, lock: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelaunchError {
    /// Whether this error ends the supervisor run (as opposed to being
    /// reported while the supervisor keeps watching).
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RelaunchError::LaunchFailure { .. }
                | RelaunchError::TerminationTimeout { .. }
                | RelaunchError::RestartAbandoned { .. }
                | RelaunchError::WatchSource { .. }
        )
    }
}

impl From<notify::Error> for RelaunchError {
    fn from(err: notify::Error) -> Self {
        RelaunchError::WatchSource {
            message: err.to_string(),
        }
    }
}
