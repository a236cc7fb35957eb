//! relaunch CLI - restart a dev server when its sources change
//!
//! Usage: relaunch [COMMAND]
//!
//! Commands:
//!   run      Run the server and restart it on changes (default)
//!   restart  Free the port and start the server detached
//!   check    Preflight the configuration
//!   init     Write a relaunch.toml template

mod commands;
mod ui;

use anyhow::Result;
use clap::Parser;
use relaunch::presentation::{Cli, Commands};
use tracing_subscriber::EnvFilter;

use commands::run::RunArgs;
use commands::GlobalArgs;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = GlobalArgs {
        json: cli.json,
        verbose: cli.verbose,
        color: cli.color,
        config: cli.config,
    };

    match cli.command {
        None => commands::run::cmd_run(&global, &RunArgs::default()),
        Some(Commands::Run {
            server,
            debounce_ms,
            watch,
            ext,
        }) => commands::run::cmd_run(
            &global,
            &RunArgs {
                server,
                debounce_ms,
                watch,
                ext,
            },
        ),
        Some(Commands::Restart { server }) => commands::restart::cmd_restart(&global, &server),
        Some(Commands::Check) => commands::check::cmd_check(&global),
        Some(Commands::Init { force }) => commands::init::cmd_init(&global, force),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("relaunch={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
