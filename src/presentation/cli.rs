//! CLI Argument Parsing
//!
//! This module defines the CLI interface using clap.
//!
//! ## Design Notes
//!
//! - Global flags (--json, --color, --verbose, --config) are inherited by all subcommands
//! - No subcommand means `run` with everything taken from config

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// relaunch - restart your dev server when its sources change
#[derive(Parser, Debug)]
#[command(name = "relaunch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Run 'relaunch init' to write a relaunch.toml template.")]
pub struct Cli {
    /// Emit NDJSON events instead of human-readable lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorWhen>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: ./relaunch.toml, then ~/.config/relaunch/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Overrides shared by commands that launch the server
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerArgs {
    /// Port the server binds (overrides [server].port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Server command (overrides [server].command)
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the server and restart it whenever watched files change
    Run {
        #[command(flatten)]
        server: ServerArgs,

        /// Minimum milliseconds between accepted changes
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,

        /// Directory to watch recursively (repeatable; replaces [watch].roots)
        #[arg(short, long = "watch", value_name = "DIR")]
        watch: Vec<PathBuf>,

        /// File extension that triggers a restart (repeatable; replaces [watch].extensions)
        #[arg(short, long = "ext", value_name = "EXT")]
        ext: Vec<String>,
    },

    /// Free the port and start the server detached, then exit
    Restart {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Preflight: command, required files, watch roots and port
    Check,

    /// Write a commented relaunch.toml into the current directory
    Init {
        /// Overwrite an existing relaunch.toml
        #[arg(short, long)]
        force: bool,
    },
}
