//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all OS interaction.
//!
//! ## Structure
//!
//! - `process` - child process control, port probe and reclaim
//! - `watch` - notify-backed change source
//! - `lock` - single-instance lock per port

pub mod lock;
pub mod process;
pub mod watch;

// Re-export for convenience
pub use lock::InstanceLock;
pub use process::{ChildHandle, PortProbe, SystemLauncher};
pub use watch::NotifySource;
