//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (policies, ports, value objects)
//! - Does NOT talk to the OS directly (that is Infrastructure)
//!
//! ## Use Cases
//!
//! - `Supervisor` - keeps the server running and restarts it on changes
//! - `CheckUseCase` - preflight checks before a run

pub mod preflight;
pub mod supervise;

pub use preflight::{CheckItem, CheckResult, CheckStatus, CheckUseCase};
pub use supervise::{
    ChangeOutcome, ManagedProcess, Supervisor, SupervisorEvent, SupervisorOptions,
    SupervisorStats,
};
