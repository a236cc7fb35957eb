//! Supervisor implementation

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::policies::{Debouncer, FilterVerdict};
use crate::domain::ports::{ChangeSource, ProcessLauncher, SourceMessage};
use crate::domain::value_objects::{ChangeEvent, ChangeKind, SupervisorState};
use crate::error::{RelaunchError, RelaunchResult};

use super::event::SupervisorEvent;
use super::options::SupervisorOptions;

/// The single live child process
#[derive(Debug)]
pub struct ManagedProcess<H> {
    pub handle: H,
    pub pid: Option<u32>,
    pub started_at: Instant,
    pub port: u16,
}

/// What `on_change` did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Filtered out before any timing rule applied
    Ignored(FilterVerdict),
    /// A restart was already pending or running
    Coalesced,
    /// Inside the debounce window of the last accepted change
    Debounced,
    /// Accepted; a restart is scheduled
    Accepted,
}

/// Counters kept for the lifetime of a supervisor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub accepted: u64,
    pub coalesced: u64,
    pub debounced: u64,
    pub ignored: u64,
    pub restarts: u64,
    pub launches: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchPhase {
    Startup,
    Restart,
}

#[derive(Debug, Clone)]
struct PendingRestart {
    due: Instant,
    trigger: PathBuf,
}

/// Restart supervisor
///
/// Owns the managed process, the debounce clock and the restart-pending
/// flag. Only the thread that drives it (through `run`, or the individual
/// operations) ever mutates them; change sources talk to it through a
/// bounded channel.
pub struct Supervisor<L: ProcessLauncher, S: ChangeSource> {
    options: SupervisorOptions,
    launcher: L,
    source: S,
    on_event: Box<dyn Fn(SupervisorEvent) + Send>,
    state: SupervisorState,
    process: Option<ManagedProcess<L::Handle>>,
    debouncer: Debouncer,
    pending: Option<PendingRestart>,
    restart_in_flight: bool,
    inbox: Option<Receiver<SourceMessage>>,
    watching: bool,
    running: Arc<AtomicBool>,
    stats: SupervisorStats,
}

impl<L: ProcessLauncher, S: ChangeSource> Supervisor<L, S> {
    pub fn new<F>(options: SupervisorOptions, launcher: L, source: S, on_event: F) -> Self
    where
        F: Fn(SupervisorEvent) + Send + 'static,
    {
        let debouncer = Debouncer::new(options.debounce);
        Self {
            options,
            launcher,
            source,
            on_event: Box::new(on_event),
            state: SupervisorState::Idle,
            process: None,
            debouncer,
            pending: None,
            restart_in_flight: false,
            inbox: None,
            watching: false,
            running: Arc::new(AtomicBool::new(true)),
            stats: SupervisorStats::default(),
        }
    }

    /// Share an externally owned running flag (e.g. flipped by a Ctrl+C handler)
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Flag that keeps `run` looping; store `false` to request shutdown
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn process(&self) -> Option<&ManagedProcess<L::Handle>> {
        self.process.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn process_handle_mut(&mut self) -> Option<&mut L::Handle> {
        self.process.as_mut().map(|p| &mut p.handle)
    }

    pub fn has_pending_restart(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// Register the watch roots, then launch the server.
    ///
    /// Returns `StartupAbandoned` once the retry budget is spent; no process
    /// is left running in that case.
    pub fn start(&mut self) -> RelaunchResult<()> {
        self.emit(SupervisorEvent::SupervisorStarted {
            server: self.options.launch.display(),
            port: self.options.port(),
            roots: self.options.roots.iter().map(|r| r.to_string()).collect(),
            debounce_ms: self.options.debounce.as_millis() as u64,
        });

        self.register_watches();
        self.launch_sequence(LaunchPhase::Startup)
    }

    /// Entry point for every raw change notification
    pub fn on_change(&mut self, event: ChangeEvent) -> ChangeOutcome {
        let verdict = self.options.policy.evaluate(&event);
        if !verdict.is_eligible() {
            self.stats.ignored += 1;
            self.emit(SupervisorEvent::ChangeIgnored {
                path: event.path.display().to_string(),
                reason: verdict.reason(),
            });
            return ChangeOutcome::Ignored(verdict);
        }

        self.schedule(event)
    }

    /// The change source lost notifications to a full inbox. Whatever was
    /// lost counts as one change that skips the filter but not the timing rules.
    pub fn on_overflow(&mut self, now: Instant) -> ChangeOutcome {
        self.emit(SupervisorEvent::InboxOverflowed {
            capacity: self.options.queue_capacity,
        });
        let trigger = self
            .options
            .roots
            .first()
            .map(|root| root.path().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        self.schedule(ChangeEvent::new(trigger, ChangeKind::Modified, now))
    }

    /// In-flight, debounce, then accept
    fn schedule(&mut self, event: ChangeEvent) -> ChangeOutcome {
        let path = event.path.display().to_string();

        if self.pending.is_some() || self.restart_in_flight {
            self.stats.coalesced += 1;
            self.emit(SupervisorEvent::ChangeCoalesced { path });
            return ChangeOutcome::Coalesced;
        }

        if !self.debouncer.admit(event.timestamp) {
            self.stats.debounced += 1;
            self.emit(SupervisorEvent::ChangeDebounced { path });
            return ChangeOutcome::Debounced;
        }

        self.stats.accepted += 1;
        let due = event.timestamp + self.options.debounce;
        self.pending = Some(PendingRestart {
            due,
            trigger: event.path.clone(),
        });
        self.emit(SupervisorEvent::ChangeAccepted {
            path,
            kind: event.kind,
            restart_in_ms: due.saturating_duration_since(Instant::now()).as_millis() as u64,
        });
        ChangeOutcome::Accepted
    }

    /// Run the scheduled restart if its window has closed by `now`
    pub fn poll_pending(&mut self, now: Instant) -> Option<RelaunchResult<()>> {
        let due = self.pending.as_ref().map(|p| p.due)?;
        if now < due {
            return None;
        }
        let trigger = self.pending.take().map(|p| p.trigger);
        Some(self.restart_with_trigger(trigger))
    }

    /// Terminate the current process, let the port settle, launch again.
    ///
    /// `RestartAbandoned` means the retry budget ran out; the supervisor
    /// keeps watching and the next accepted change tries again.
    pub fn restart(&mut self) -> RelaunchResult<()> {
        self.pending = None;
        self.restart_with_trigger(None)
    }

    /// Terminate the process (if any) and stop watching. Idempotent.
    pub fn stop(&mut self) {
        self.pending = None;

        if self.process.is_some() {
            self.set_state(SupervisorState::Stopping);
            self.terminate_current();
        }

        self.release_watches();
        self.set_state(SupervisorState::Idle);
    }

    /// Drive the supervisor until the running flag is cleared.
    ///
    /// Fails only when the initial launch is abandoned.
    pub fn run(&mut self) -> RelaunchResult<()> {
        if let Err(err) = self.start() {
            // Abandoned is terminal; nothing is running, so only the watches go.
            self.pending = None;
            self.release_watches();
            return Err(err);
        }

        while self.is_running() {
            self.tick();
        }

        self.stop();
        self.emit(SupervisorEvent::Shutdown {
            restarts: self.stats.restarts,
        });
        Ok(())
    }

    /// One control-loop iteration: take at most one inbox message, run a
    /// due restart, notice an unexpected exit.
    pub fn tick(&mut self) {
        let tick = self.options.tick;
        let message = match &self.inbox {
            Some(rx) => rx.recv_timeout(tick),
            None => {
                std::thread::sleep(tick);
                Err(RecvTimeoutError::Timeout)
            }
        };

        match message {
            Ok(SourceMessage::Change(event)) => {
                self.on_change(event);
            }
            Ok(SourceMessage::Error(message)) => {
                self.emit(SupervisorEvent::WatchSourceError { message });
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                self.inbox = None;
                self.emit(SupervisorEvent::WatchSourceError {
                    message: "change source disconnected; no longer watching".to_string(),
                });
            }
        }

        if self.watching && self.source.take_overflow() {
            self.on_overflow(Instant::now());
        }

        if let Some(Err(err)) = self.poll_pending(Instant::now()) {
            tracing::warn!("{}", err);
        }

        self.check_process();
    }

    fn register_watches(&mut self) {
        let (tx, rx) = mpsc::sync_channel(self.options.queue_capacity);
        match self.source.watch(&self.options.roots, tx) {
            Ok(()) => {
                self.watching = true;
            }
            Err(err) => {
                self.emit(SupervisorEvent::WatchSourceError {
                    message: err.to_string(),
                });
            }
        }
        // Kept even on failure: partial registration errors are queued there.
        self.inbox = Some(rx);
    }

    fn release_watches(&mut self) {
        if self.watching {
            self.source.unwatch();
            self.watching = false;
        }
        self.inbox = None;
    }

    fn restart_with_trigger(&mut self, trigger: Option<PathBuf>) -> RelaunchResult<()> {
        self.restart_in_flight = true;
        self.stats.restarts += 1;
        self.emit(SupervisorEvent::RestartStarted {
            trigger: trigger.map(|p| p.display().to_string()),
        });

        if self.process.is_some() {
            self.set_state(SupervisorState::Stopping);
            self.terminate_current();
            self.sleep_while_running(self.options.settle);
        }

        let result = self.launch_sequence(LaunchPhase::Restart);
        self.restart_in_flight = false;

        if result.is_ok() {
            if let Some(process) = &self.process {
                let pid = process.pid;
                self.emit(SupervisorEvent::RestartComplete {
                    pid,
                    restarts: self.stats.restarts,
                });
            }
        }
        result
    }

    fn launch_sequence(&mut self, phase: LaunchPhase) -> RelaunchResult<()> {
        self.set_state(SupervisorState::Starting);
        let retry = self.options.retry;
        let max_attempts = retry.max_attempts();
        let mut failed = 0;

        while failed < max_attempts && self.is_running() {
            let attempt = failed + 1;
            self.emit(SupervisorEvent::LaunchAttempt {
                attempt,
                max_attempts,
            });

            match self.try_launch() {
                Ok(process) => {
                    let pid = process.pid;
                    let port = process.port;
                    self.process = Some(process);
                    self.set_state(SupervisorState::Running);
                    self.emit(SupervisorEvent::ProcessRunning { pid, port });
                    return Ok(());
                }
                Err(err) => {
                    failed = attempt;
                    self.emit(SupervisorEvent::LaunchFailed {
                        attempt,
                        max_attempts,
                        reason: err.to_string(),
                    });
                    if retry.should_retry(failed) {
                        let delay = retry.delay_after(failed);
                        self.emit(SupervisorEvent::RetryScheduled {
                            next_attempt: attempt + 1,
                            delay_ms: delay.as_millis() as u64,
                        });
                        self.sleep_while_running(delay);
                    }
                }
            }
        }

        if !self.is_running() && failed < max_attempts {
            // Shutdown requested mid-sequence; `stop` reaps anything left.
            self.terminate_current();
            self.set_state(SupervisorState::Idle);
            return Ok(());
        }

        self.terminate_current();
        self.set_state(SupervisorState::Abandoned);
        match phase {
            LaunchPhase::Startup => {
                self.emit(SupervisorEvent::StartupAbandoned { attempts: failed });
                Err(RelaunchError::StartupAbandoned { attempts: failed })
            }
            LaunchPhase::Restart => {
                self.emit(SupervisorEvent::RestartAbandoned { attempts: failed });
                Err(RelaunchError::RestartAbandoned { attempts: failed })
            }
        }
    }

    fn try_launch(&mut self) -> RelaunchResult<ManagedProcess<L::Handle>> {
        let port = self.options.port();

        if self.options.reclaim_port {
            match self.launcher.reclaim_port(port) {
                Ok(pids) if !pids.is_empty() => {
                    self.emit(SupervisorEvent::PortReclaimed { port, pids });
                }
                Ok(_) => {}
                Err(err) => tracing::debug!("port {} reclaim skipped: {}", port, err),
            }
        }

        let mut handle = self
            .launcher
            .launch(&self.options.launch)
            .map_err(|e| RelaunchError::LaunchFailure {
                reason: format!("failed to spawn `{}`: {}", self.options.launch.display(), e),
            })?;
        self.stats.launches += 1;
        let pid = self.launcher.pid(&handle);
        let started_at = Instant::now();

        let grace = self.options.startup_grace;
        let deadline = started_at + grace;
        loop {
            if !self.launcher.is_alive(&mut handle) {
                // Reap it; exit status is irrelevant here.
                self.launcher.force_kill(&mut handle);
                return Err(RelaunchError::LaunchFailure {
                    reason: format!(
                        "process exited within the {}ms startup grace window",
                        grace.as_millis()
                    ),
                });
            }
            if self.options.probe_port && self.launcher.is_listening(port) {
                break;
            }
            let now = Instant::now();
            if now >= deadline || !self.is_running() {
                break;
            }
            std::thread::sleep(self.options.tick.min(deadline - now));
        }

        if self.options.probe_port && self.is_running() && !self.launcher.is_listening(port) {
            self.launcher
                .terminate(&mut handle, self.options.terminate_timeout);
            self.launcher.force_kill(&mut handle);
            return Err(RelaunchError::LaunchFailure {
                reason: format!("process is not listening on port {}", port),
            });
        }

        Ok(ManagedProcess {
            handle,
            pid,
            started_at,
            port,
        })
    }

    /// Graceful terminate with a bounded wait, escalating to a kill
    fn terminate_current(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };
        let pid = process.pid;
        let timeout = self.options.terminate_timeout;

        self.emit(SupervisorEvent::ProcessStopping { pid });
        let exited = self.launcher.terminate(&mut process.handle, timeout);
        if !exited {
            tracing::warn!(
                "{}; escalating to kill",
                RelaunchError::TerminationTimeout {
                    pid: pid.unwrap_or_default(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            );
            self.emit(SupervisorEvent::TerminationTimeout {
                pid,
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        // Always reap; after a clean exit this is a no-op kill.
        self.launcher.force_kill(&mut process.handle);
        self.emit(SupervisorEvent::ProcessStopped {
            pid,
            forced: !exited,
        });
    }

    fn check_process(&mut self) {
        if self.state != SupervisorState::Running {
            return;
        }
        let alive = match self.process.as_mut() {
            Some(process) => self.launcher.is_alive(&mut process.handle),
            None => false,
        };
        if alive {
            return;
        }
        if let Some(mut process) = self.process.take() {
            self.launcher.force_kill(&mut process.handle);
            self.emit(SupervisorEvent::ProcessExited { pid: process.pid });
        }
        self.set_state(SupervisorState::Exited);
    }

    fn set_state(&mut self, to: SupervisorState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!("supervisor state {} -> {}", from, to);
        self.emit(SupervisorEvent::StateChanged { from, to });
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sleep up to `total`, waking early on shutdown. Returns false if woken early.
    fn sleep_while_running(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(self.options.tick.min(deadline - now));
        }
        false
    }

    fn emit(&self, event: SupervisorEvent) {
        (self.on_event)(event);
    }
}

impl<L: ProcessLauncher, S: ChangeSource> Drop for Supervisor<L, S> {
    fn drop(&mut self) {
        // No child outlives its supervisor.
        if self.process.is_some() {
            self.terminate_current();
        }
        if self.watching {
            self.source.unwatch();
        }
    }
}
