//! Supervisor event types

use crate::domain::value_objects::{ChangeKind, SupervisorState};

/// Events emitted on every lifecycle transition and every change decision
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SupervisorEvent {
    /// Supervisor started and registered its watch roots
    SupervisorStarted {
        server: String,
        port: u16,
        roots: Vec<String>,
        debounce_ms: u64,
    },
    /// Lifecycle state changed
    StateChanged {
        from: SupervisorState,
        to: SupervisorState,
    },
    /// About to launch the server
    LaunchAttempt { attempt: u32, max_attempts: u32 },
    /// Stale listeners were killed before launching
    PortReclaimed { port: u16, pids: Vec<u32> },
    /// Server survived its startup grace window
    ProcessRunning { pid: Option<u32>, port: u16 },
    /// A launch attempt failed
    LaunchFailed {
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },
    /// Waiting before the next launch attempt
    RetryScheduled { next_attempt: u32, delay_ms: u64 },
    /// Initial launch gave up
    StartupAbandoned { attempts: u32 },
    /// Change filtered out (directory, extension, excluded marker)
    ChangeIgnored { path: String, reason: String },
    /// Change arrived while a restart was already pending or running
    ChangeCoalesced { path: String },
    /// Change arrived inside the debounce window
    ChangeDebounced { path: String },
    /// Changes were lost to a full inbox; handled as one change
    InboxOverflowed { capacity: usize },
    /// Change accepted; a restart is scheduled
    ChangeAccepted {
        path: String,
        kind: ChangeKind,
        restart_in_ms: u64,
    },
    /// Restart sequence began
    RestartStarted { trigger: Option<String> },
    /// Sending the terminate signal
    ProcessStopping { pid: Option<u32> },
    /// Graceful terminate timed out; escalating to a kill
    TerminationTimeout { pid: Option<u32>, timeout_ms: u64 },
    /// Server process is gone
    ProcessStopped { pid: Option<u32>, forced: bool },
    /// Restart finished with a running server
    RestartComplete { pid: Option<u32>, restarts: u64 },
    /// Restart gave up; still watching
    RestartAbandoned { attempts: u32 },
    /// Server exited without being asked to
    ProcessExited { pid: Option<u32> },
    /// Change source reported a problem
    WatchSourceError { message: String },
    /// Supervisor stopped
    Shutdown { restarts: u64 },
}

impl SupervisorEvent {
    /// Stable event name; matches the `event` field of the JSON form
    pub fn name(&self) -> &'static str {
        match self {
            SupervisorEvent::SupervisorStarted { .. } => "supervisor_started",
            SupervisorEvent::StateChanged { .. } => "state_changed",
            SupervisorEvent::LaunchAttempt { .. } => "launch_attempt",
            SupervisorEvent::PortReclaimed { .. } => "port_reclaimed",
            SupervisorEvent::ProcessRunning { .. } => "process_running",
            SupervisorEvent::LaunchFailed { .. } => "launch_failed",
            SupervisorEvent::RetryScheduled { .. } => "retry_scheduled",
            SupervisorEvent::StartupAbandoned { .. } => "startup_abandoned",
            SupervisorEvent::ChangeIgnored { .. } => "change_ignored",
            SupervisorEvent::ChangeCoalesced { .. } => "change_coalesced",
            SupervisorEvent::ChangeDebounced { .. } => "change_debounced",
            SupervisorEvent::InboxOverflowed { .. } => "inbox_overflowed",
            SupervisorEvent::ChangeAccepted { .. } => "change_accepted",
            SupervisorEvent::RestartStarted { .. } => "restart_started",
            SupervisorEvent::ProcessStopping { .. } => "process_stopping",
            SupervisorEvent::TerminationTimeout { .. } => "termination_timeout",
            SupervisorEvent::ProcessStopped { .. } => "process_stopped",
            SupervisorEvent::RestartComplete { .. } => "restart_complete",
            SupervisorEvent::RestartAbandoned { .. } => "restart_abandoned",
            SupervisorEvent::ProcessExited { .. } => "process_exited",
            SupervisorEvent::WatchSourceError { .. } => "watch_source_error",
            SupervisorEvent::Shutdown { .. } => "shutdown",
        }
    }

    /// Events describing a dropped change (only shown in verbose human output)
    pub fn is_change_noise(&self) -> bool {
        matches!(
            self,
            SupervisorEvent::ChangeIgnored { .. } | SupervisorEvent::StateChanged { .. }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SupervisorEvent::LaunchFailed { .. }
                | SupervisorEvent::StartupAbandoned { .. }
                | SupervisorEvent::RestartAbandoned { .. }
                | SupervisorEvent::WatchSourceError { .. }
                | SupervisorEvent::ProcessExited { .. }
        )
    }

    /// Convert to JSON string with "command": "run" field included
    pub fn to_json(&self) -> String {
        let mut value =
            serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"event": "error"}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("command".to_string(), serde_json::json!("run"));
        }
        serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
    }
}
