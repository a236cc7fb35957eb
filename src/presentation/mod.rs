//! Presentation Layer
//!
//! CLI argument parsing (via clap) and the mapping from parsed flags onto
//! configuration. Rendering lives in the binary's `ui` module.

pub mod cli;

pub use cli::{Cli, ColorWhen, Commands, ServerArgs};

use crate::config::Config;

impl ServerArgs {
    /// Apply `--port` and the trailing command on top of `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if !self.command.is_empty() {
            config.server.command.0 = self.command.clone();
        }
    }
}
