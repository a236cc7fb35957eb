//! ChangeSource port - recursive file-system change notifications
//!
//! Sources deliver on their own thread; everything they produce is handed
//! to the supervisor's control thread through a bounded channel so the
//! control thread stays the only writer of supervisor state.

use std::sync::mpsc::SyncSender;

use crate::domain::value_objects::{ChangeEvent, WatchRoot};
use crate::error::RelaunchResult;

/// What a source pushes into the supervisor's inbox
#[derive(Debug, Clone)]
pub enum SourceMessage {
    Change(ChangeEvent),
    /// The notification mechanism reported a problem; the source keeps going
    Error(String),
}

pub trait ChangeSource {
    /// Start watching `roots` recursively, delivering into `sink` until
    /// `unwatch` is called. Roots that cannot be registered are reported
    /// through `sink`; an error is returned only when nothing could be watched.
    fn watch(&mut self, roots: &[WatchRoot], sink: SyncSender<SourceMessage>) -> RelaunchResult<()>;

    /// Stop delivering. Calling it when not watching is a no-op.
    fn unwatch(&mut self);

    /// Whether changes were lost to a full inbox since the last call.
    /// Clears the flag.
    fn take_overflow(&mut self) -> bool {
        false
    }
}
