//! relaunch - debounced file-watch supervisor for development servers
//!
//! relaunch keeps exactly one application server process running, watches
//! the project's source tree, and replaces the server with a fresh process
//! whenever an eligible file changes. Bursts of changes collapse into one
//! restart; failed launches are retried with backoff.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    ChangeOutcome, CheckUseCase, Supervisor, SupervisorEvent, SupervisorOptions, SupervisorStats,
};
pub use config::Config;
pub use domain::policies::{Backoff, Debouncer, FilterVerdict, RetryPolicy, WatchPolicy};
pub use domain::ports::{ChangeSource, LaunchSpec, OutputMode, ProcessLauncher, SourceMessage};
pub use domain::value_objects::{ChangeEvent, ChangeKind, SupervisorState, WatchRoot};
pub use error::{RelaunchError, RelaunchResult};
pub use infrastructure::{InstanceLock, NotifySource, PortProbe, SystemLauncher};
