//! Property tests for supervisor change handling.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use relaunch::{
    Backoff, ChangeEvent, ChangeKind, ChangeOutcome, ChangeSource, LaunchSpec, ProcessLauncher,
    RelaunchResult, RetryPolicy, SourceMessage, Supervisor, SupervisorOptions, WatchPolicy,
    WatchRoot,
};

#[derive(Default)]
struct Live {
    now: AtomicUsize,
    max: AtomicUsize,
}

struct InMemoryLauncher {
    live: Arc<Live>,
}

struct Handle {
    alive: bool,
}

impl ProcessLauncher for InMemoryLauncher {
    type Handle = Handle;

    fn launch(&mut self, _spec: &LaunchSpec) -> io::Result<Handle> {
        let now = self.live.now.fetch_add(1, Ordering::SeqCst) + 1;
        self.live.max.fetch_max(now, Ordering::SeqCst);
        Ok(Handle { alive: true })
    }

    fn terminate(&mut self, handle: &mut Handle, _timeout: Duration) -> bool {
        self.force_kill(handle);
        true
    }

    fn force_kill(&mut self, handle: &mut Handle) {
        if handle.alive {
            handle.alive = false;
            self.live.now.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_alive(&mut self, handle: &mut Handle) -> bool {
        handle.alive
    }
}

struct SilentSource;

impl ChangeSource for SilentSource {
    fn watch(&mut self, _roots: &[WatchRoot], _sink: SyncSender<SourceMessage>) -> RelaunchResult<()> {
        Ok(())
    }

    fn unwatch(&mut self) {}
}

const DEBOUNCE_MS: u64 = 500;

fn options() -> SupervisorOptions {
    let spec = LaunchSpec::from_argv(&["python".to_string(), "app.py".to_string()], ".", 7861)
        .expect("argv is not empty");
    SupervisorOptions::new(spec)
        .with_roots(vec![WatchRoot::new(".")])
        .with_policy(WatchPolicy::new(["py", "css"], ["__pycache__", ".pyc"]))
        .with_debounce(Duration::from_millis(DEBOUNCE_MS))
        .with_startup_grace(Duration::ZERO)
        .with_terminate_timeout(Duration::from_millis(1))
        .with_settle(Duration::ZERO)
        .with_retry(RetryPolicy::new(1, Backoff::Fixed(Duration::ZERO)))
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("app.py".to_string()),
        Just("static/style.css".to_string()),
        Just("README.md".to_string()),
        Just("__pycache__/app.cpython-312.py".to_string()),
        Just("app.pyc".to_string()),
        Just("pkg/__pycache__/mod.py".to_string()),
        "[a-z]{1,6}\\.(py|css|txt|PY)",
    ]
}

/// (path, milliseconds since the previous event, poll after delivering)
fn step_strategy() -> impl Strategy<Value = (String, u64, bool)> {
    (path_strategy(), 0u64..1_500, any::<bool>())
}

fn is_excluded(path: &str) -> bool {
    path.contains("__pycache__") || path.ends_with(".pyc")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: restarts never outnumber accepted changes, excluded paths are
    /// never accepted, accepted changes are at least one debounce window apart
    /// and at most one server process is ever alive.
    #[test]
    fn property_change_stream_invariants(
        steps in proptest::collection::vec(step_strategy(), 1..=40),
    ) {
        let live = Arc::new(Live::default());
        let launcher = InMemoryLauncher { live: Arc::clone(&live) };
        let mut supervisor = Supervisor::new(options(), launcher, SilentSource, |_| {});
        supervisor.start().unwrap();

        let base = Instant::now();
        let mut offset = 0u64;
        let mut last_accepted: Option<u64> = None;
        let mut delivered = 0u64;

        for (path, gap, poll) in steps {
            offset += gap;
            let at = base + Duration::from_millis(offset);
            let outcome = supervisor.on_change(ChangeEvent::new(path.as_str(), ChangeKind::Modified, at));
            delivered += 1;

            if outcome == ChangeOutcome::Accepted {
                prop_assert!(!is_excluded(&path), "excluded path accepted: {}", path);
                if let Some(prev) = last_accepted {
                    prop_assert!(offset - prev >= DEBOUNCE_MS);
                }
                last_accepted = Some(offset);
            }

            if poll {
                let _ = supervisor.poll_pending(at + Duration::from_millis(DEBOUNCE_MS));
            }
            prop_assert!(live.now.load(Ordering::SeqCst) <= 1);
        }

        let stats = supervisor.stats();
        prop_assert!(stats.restarts <= stats.accepted);
        // every delivered change gets exactly one decision
        prop_assert_eq!(
            stats.accepted + stats.coalesced + stats.debounced + stats.ignored,
            delivered
        );

        supervisor.stop();
        prop_assert_eq!(live.now.load(Ordering::SeqCst), 0);
        prop_assert_eq!(live.max.load(Ordering::SeqCst), 1);
    }
}
