//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod change;
mod state;

pub use change::{ChangeEvent, ChangeKind, WatchRoot};
pub use state::SupervisorState;
