//! Supervisor lifecycle state
//!
//! `Idle -> Starting -> Running -> Stopping -> Starting -> Running -> ...`
//! with `Running -> Idle` only on an explicit stop and
//! `Starting -> Abandoned` once the launch retry budget is spent.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// Not started, or stopped
    #[default]
    Idle,
    /// Launch sequence in progress (including retries)
    Starting,
    /// Managed process is up
    Running,
    /// Terminating the managed process ahead of a restart
    Stopping,
    /// Managed process exited on its own; waiting for the next change
    Exited,
    /// Retry budget exhausted; no process running
    Abandoned,
}

impl SupervisorState {
    /// Whether a managed process is expected to exist in this state
    pub fn has_process(&self) -> bool {
        matches!(self, SupervisorState::Running | SupervisorState::Stopping)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopping => "stopping",
            SupervisorState::Exited => "exited",
            SupervisorState::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
