//! ProcessLauncher port - starts and stops the application server
//!
//! The supervisor only ever holds one handle at a time and is the only
//! caller of `terminate`/`force_kill` on it.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Where the child's stdout/stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Share the supervisor's terminal
    Inherit,
    /// Read on dedicated threads and print as `[server] <line>`
    #[default]
    Prefixed,
    /// Like `Prefixed`, but everything goes to stderr (keeps NDJSON stdout clean)
    PrefixedStderr,
    /// Discard output
    Null,
}

/// Everything needed to launch the application server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub port: u16,
    pub output: OutputMode,
}

impl LaunchSpec {
    /// Build a spec from an argv-style command line. Returns `None` when the
    /// command is empty.
    pub fn from_argv(argv: &[String], working_dir: impl Into<PathBuf>, port: u16) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
            port,
            output: OutputMode::default(),
        })
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Command line as typed, for log lines
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Abstract process control
///
/// Implementations:
/// - `SystemLauncher` - real child processes via `std::process::Command`
/// - scripted fakes in tests
pub trait ProcessLauncher {
    type Handle;

    /// Spawn the process described by `spec`
    fn launch(&mut self, spec: &LaunchSpec) -> io::Result<Self::Handle>;

    /// Ask the process to exit and wait up to `timeout`.
    /// Returns `true` if it is gone when this returns.
    fn terminate(&mut self, handle: &mut Self::Handle, timeout: Duration) -> bool;

    /// Kill without asking and reap
    fn force_kill(&mut self, handle: &mut Self::Handle);

    fn is_alive(&mut self, handle: &mut Self::Handle) -> bool;

    fn pid(&self, _handle: &Self::Handle) -> Option<u32> {
        None
    }

    /// Best effort: kill whatever else is listening on `port`, returning
    /// the pids that were signalled.
    fn reclaim_port(&mut self, _port: u16) -> io::Result<Vec<u32>> {
        Ok(Vec::new())
    }

    /// Whether something accepts TCP connections on `port`
    fn is_listening(&mut self, _port: u16) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_argv_splits_program_and_args() {
        let spec = LaunchSpec::from_argv(&argv(&["python", "demo_dev.py"]), ".", 7861).unwrap();
        assert_eq!(spec.program, "python");
        assert_eq!(spec.args, vec!["demo_dev.py"]);
        assert_eq!(spec.display(), "python demo_dev.py");
    }

    #[test]
    fn from_argv_rejects_empty_command() {
        assert!(LaunchSpec::from_argv(&[], ".", 7861).is_none());
        assert!(LaunchSpec::from_argv(&argv(&["  "]), ".", 7861).is_none());
    }
}
