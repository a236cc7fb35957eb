//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod change_source;
pub mod process_launcher;

pub use change_source::{ChangeSource, SourceMessage};
pub use process_launcher::{LaunchSpec, OutputMode, ProcessLauncher};
