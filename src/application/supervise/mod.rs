//! Supervise Use Case
//!
//! Keeps one application server running and replaces it whenever an
//! eligible source file changes. It orchestrates:
//! - Change filtering (directories, extensions, cache markers)
//! - Debouncing (one restart per burst of changes)
//! - Terminate-then-launch restarts with bounded waits
//! - Launch retries with backoff
//!
//! ## Architecture
//!
//! - `Supervisor` - the state machine, driven by a single control thread
//! - `SupervisorOptions` - timing, retry and watch settings
//! - `SupervisorEvent` - lifecycle and change notifications for the operator
//!
//! ## Usage
//!
//! ```ignore
//! let options = SupervisorOptions::new(spec).with_roots(roots);
//! let mut supervisor = Supervisor::new(options, SystemLauncher::new(), NotifySource::new(), |event| { ... });
//! supervisor.run()?;
//! ```

mod event;
mod options;
mod use_case;


pub use event::SupervisorEvent;
pub use options::SupervisorOptions;
pub use use_case::{ChangeOutcome, ManagedProcess, Supervisor, SupervisorStats};
