//! notify-backed change source
//!
//! The notify callback runs on notify's own thread; it only translates
//! events and pushes them into the supervisor's bounded inbox.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Instant;

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::domain::ports::{ChangeSource, SourceMessage};
use crate::domain::value_objects::{ChangeEvent, ChangeKind, WatchRoot};
use crate::error::{RelaunchError, RelaunchResult};

/// Recursive watcher over one or more roots
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
    watched: Vec<PathBuf>,
    overflowed: Arc<AtomicBool>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots that were registered successfully
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

impl ChangeSource for NotifySource {
    fn watch(&mut self, roots: &[WatchRoot], sink: SyncSender<SourceMessage>) -> RelaunchResult<()> {
        self.unwatch();

        let callback_sink = sink.clone();
        let overflowed = Arc::clone(&self.overflowed);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for change in translate(event, Instant::now()) {
                        deliver(&callback_sink, &overflowed, SourceMessage::Change(change));
                    }
                }
                Err(err) => deliver(
                    &callback_sink,
                    &overflowed,
                    SourceMessage::Error(err.to_string()),
                ),
            },
            Config::default(),
        )?;

        let mut watched = Vec::new();
        for root in roots {
            match watcher.watch(root.path(), RecursiveMode::Recursive) {
                Ok(()) => {
                    tracing::debug!("watching {}", root);
                    watched.push(root.path().to_path_buf());
                }
                Err(err) => {
                    tracing::warn!("cannot watch {}: {}", root, err);
                    deliver(
                        &sink,
                        &self.overflowed,
                        SourceMessage::Error(format!("cannot watch {}: {}", root, err)),
                    );
                }
            }
        }

        if watched.is_empty() {
            return Err(RelaunchError::WatchSource {
                message: format!("none of the {} watch root(s) could be registered", roots.len()),
            });
        }

        self.watcher = Some(watcher);
        self.watched = watched;
        Ok(())
    }

    fn unwatch(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            for path in self.watched.drain(..) {
                let _ = watcher.unwatch(&path);
            }
        }
        self.watched.clear();
        self.overflowed.store(false, Ordering::SeqCst);
    }

    fn take_overflow(&mut self) -> bool {
        self.overflowed.swap(false, Ordering::SeqCst)
    }
}

/// Never blocks the notify thread. A change that does not fit is recorded
/// in `overflowed` so the supervisor still sees that something changed.
fn deliver(sink: &SyncSender<SourceMessage>, overflowed: &AtomicBool, message: SourceMessage) {
    match sink.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(SourceMessage::Change(change))) => {
            if !overflowed.swap(true, Ordering::SeqCst) {
                tracing::debug!("change inbox full at {}; recording overflow", change.path.display());
            }
        }
        Err(TrySendError::Full(SourceMessage::Error(message))) => {
            tracing::warn!("change inbox full; watch error not delivered: {}", message);
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}

/// Map a raw notify event to the change events the supervisor filters
fn translate(event: Event, timestamp: Instant) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Moved,
        EventKind::Modify(_) => ChangeKind::Modified,
        _ => return Vec::new(),
    };
    let folder_hint = matches!(event.kind, EventKind::Create(CreateKind::Folder));

    let paths = match event.kind {
        // Both halves of a rename arrive together; the destination is what matters.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.into_iter().last().into_iter().collect()
        }
        _ => event.paths,
    };

    paths
        .into_iter()
        .map(|path| {
            let is_directory = folder_hint || path.is_dir();
            let change = ChangeEvent::new(path, kind, timestamp);
            if is_directory {
                change.directory()
            } else {
                change
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, RemoveKind};
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::tempdir;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn translate_maps_kinds() {
        let now = Instant::now();
        let created = translate(event(EventKind::Create(CreateKind::File), &["/p/a.py"]), now);
        assert_eq!(created[0].kind, ChangeKind::Created);

        let modified = translate(
            event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/p/a.py"],
            ),
            now,
        );
        assert_eq!(modified[0].kind, ChangeKind::Modified);
        assert!(!modified[0].is_directory);
    }

    #[test]
    fn translate_rename_keeps_destination() {
        let changes = translate(
            event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/p/.a.py.swp", "/p/a.py"],
            ),
            Instant::now(),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Moved);
        assert_eq!(changes[0].path, PathBuf::from("/p/a.py"));
    }

    #[test]
    fn translate_drops_access_and_remove() {
        let now = Instant::now();
        assert!(translate(event(EventKind::Access(AccessKind::Any), &["/p/a.py"]), now).is_empty());
        assert!(translate(event(EventKind::Remove(RemoveKind::File), &["/p/a.py"]), now).is_empty());
    }

    #[test]
    fn translate_marks_folder_creation_as_directory() {
        let changes = translate(
            event(EventKind::Create(CreateKind::Folder), &["/p/pkg.py"]),
            Instant::now(),
        );
        assert!(changes[0].is_directory);
    }

    #[test]
    fn watch_fails_when_no_root_registers() {
        let dir = tempdir().unwrap();
        let missing = WatchRoot::new(dir.path().join("missing"));
        let (tx, rx) = mpsc::sync_channel(8);

        let mut source = NotifySource::new();
        let err = source.watch(&[missing], tx).unwrap_err();
        assert!(matches!(err, RelaunchError::WatchSource { .. }));
        assert!(matches!(rx.try_recv(), Ok(SourceMessage::Error(_))));
    }

    #[test]
    fn watch_reports_bad_root_but_keeps_good_one() {
        let dir = tempdir().unwrap();
        let good = WatchRoot::new(dir.path());
        let bad = WatchRoot::new(dir.path().join("missing"));
        let (tx, rx) = mpsc::sync_channel(8);

        let mut source = NotifySource::new();
        source.watch(&[good, bad], tx).unwrap();
        assert_eq!(source.watched().len(), 1);
        assert!(matches!(rx.try_recv(), Ok(SourceMessage::Error(_))));
        source.unwatch();
        assert!(source.watched().is_empty());
    }

    #[test]
    fn full_inbox_records_overflow_instead_of_blocking() {
        let (tx, rx) = mpsc::sync_channel(1);
        let overflowed = AtomicBool::new(false);

        deliver(&tx, &overflowed, SourceMessage::Change(ChangeEvent::modified("/p/a.pyc")));
        assert!(!overflowed.load(Ordering::SeqCst));
        deliver(&tx, &overflowed, SourceMessage::Change(ChangeEvent::modified("/p/app.py")));
        assert!(overflowed.load(Ordering::SeqCst));

        assert!(matches!(rx.try_recv(), Ok(SourceMessage::Change(c)) if c.path.ends_with("a.pyc")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn undrained_inbox_records_overflow() {
        let dir = tempdir().unwrap();
        let (tx, _rx) = mpsc::sync_channel(4);
        let mut source = NotifySource::new();
        source.watch(&[WatchRoot::new(dir.path())], tx).unwrap();
        std::thread::sleep(Duration::from_millis(100));

        let cache = dir.path().join("__pycache__");
        std::fs::create_dir(&cache).unwrap();
        for i in 0..20 {
            std::fs::write(cache.join(format!("mod{}.pyc", i)), "x").unwrap();
        }
        std::fs::write(dir.path().join("app.py"), "print('hi')\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut overflowed = false;
        while Instant::now() < deadline {
            if source.take_overflow() {
                overflowed = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        source.unwatch();
        assert!(overflowed, "expected the full inbox to be recorded");
    }

    #[test]
    fn file_write_is_delivered() {
        let dir = tempdir().unwrap();
        let (tx, rx) = mpsc::sync_channel(64);
        let mut source = NotifySource::new();
        source.watch(&[WatchRoot::new(dir.path())], tx).unwrap();

        std::thread::sleep(Duration::from_millis(100));
        std::fs::write(dir.path().join("app.py"), "print('hi')\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = false;
        while Instant::now() < deadline {
            if let Ok(SourceMessage::Change(change)) = rx.recv_timeout(Duration::from_millis(100)) {
                if change.path.ends_with("app.py") {
                    seen = true;
                    break;
                }
            }
        }
        source.unwatch();
        assert!(seen, "expected a change for app.py");
    }
}
