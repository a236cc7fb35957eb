//! Domain Layer
//!
//! The supervisor's pure rules: what a change is, which changes count,
//! when the debounce window admits one, how launch retries back off, and
//! the lifecycle states a supervisor moves through.
//!
//! ## Structure
//!
//! - `value_objects/` - Immutable value types (ChangeEvent, WatchRoot, SupervisorState)
//! - `policies/` - Business rules (WatchPolicy, Debouncer, RetryPolicy)
//! - `ports/` - Interface definitions for infrastructure (ProcessLauncher, ChangeSource)
//!
//! Nothing in here spawns processes or touches the file system; time is
//! always passed in as an `Instant` so the rules can be tested without sleeping.

pub mod policies;
pub mod ports;
pub mod value_objects;
