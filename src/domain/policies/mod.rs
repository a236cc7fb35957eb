//! Domain Policies
//!
//! Business rules that decide whether a change restarts the server and how
//! launch failures are retried. All of them are pure and clock-agnostic.

mod debounce;
mod retry;
mod watch_policy;

pub use debounce::Debouncer;
pub use retry::{Backoff, RetryPolicy};
pub use watch_policy::{FilterVerdict, WatchPolicy};
