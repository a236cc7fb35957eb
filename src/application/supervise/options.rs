//! Supervisor options

use std::time::Duration;

use crate::domain::policies::{RetryPolicy, WatchPolicy};
use crate::domain::ports::LaunchSpec;
use crate::domain::value_objects::WatchRoot;

/// Default control-loop tick
pub const DEFAULT_TICK_MS: u64 = 50;

/// Supervisor options
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// What to run
    pub launch: LaunchSpec,
    /// Directories watched recursively
    pub roots: Vec<WatchRoot>,
    /// Which changes are eligible
    pub policy: WatchPolicy,
    /// Minimum spacing between accepted changes
    pub debounce: Duration,
    /// How long a fresh process must survive to count as started
    pub startup_grace: Duration,
    /// Graceful terminate budget before a forced kill
    pub terminate_timeout: Duration,
    /// Pause after stopping the old process so the OS releases the port
    pub settle: Duration,
    /// Launch retry budget
    pub retry: RetryPolicy,
    /// Require the port to accept connections before the grace window ends
    pub probe_port: bool,
    /// Kill stale listeners on the port before launching
    pub reclaim_port: bool,
    /// Capacity of the change inbox
    pub queue_capacity: usize,
    /// Control-loop poll interval
    pub tick: Duration,
}

impl SupervisorOptions {
    /// Create options with the defaults of the hot-reload launcher
    pub fn new(launch: LaunchSpec) -> Self {
        Self {
            launch,
            roots: Vec::new(),
            policy: WatchPolicy::default(),
            debounce: Duration::from_secs(2),
            startup_grace: Duration::from_secs(3),
            terminate_timeout: Duration::from_secs(5),
            settle: Duration::from_secs(2),
            retry: RetryPolicy::default(),
            probe_port: false,
            reclaim_port: false,
            queue_capacity: 1024,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }

    pub fn with_roots(mut self, roots: Vec<WatchRoot>) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_policy(mut self, policy: WatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    pub fn with_terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_probe_port(mut self, probe: bool) -> Self {
        self.probe_port = probe;
        self
    }

    pub fn with_reclaim_port(mut self, reclaim: bool) -> Self {
        self.reclaim_port = reclaim;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn port(&self) -> u16 {
        self.launch.port
    }

    /// Worst-case duration of one restart: graceful terminate, settle, every
    /// launch attempt's grace window and the backoff between them.
    pub fn restart_budget(&self) -> Duration {
        let attempts = self.retry.max_attempts();
        self.terminate_timeout
            .saturating_add(self.settle)
            .saturating_add(self.startup_grace.saturating_mul(attempts))
            .saturating_add(self.retry.total_backoff())
    }
}
