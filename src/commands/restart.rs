use std::time::Duration;

use anyhow::{Context, Result};
use relaunch::domain::ports::{OutputMode, ProcessLauncher};
use relaunch::infrastructure::SystemLauncher;
use relaunch::presentation::ServerArgs;

use super::{load_config, project_dir, report_warnings, GlobalArgs};
use crate::ui::context::UiContext;
use crate::ui::primitives::icon::Icon;

/// Free the port, start the server detached and exit
pub fn cmd_restart(global: &GlobalArgs, server: &ServerArgs) -> Result<()> {
    let project_dir = project_dir()?;
    let (mut config, warnings) = load_config(global, &project_dir)?;
    server.apply(&mut config);

    let ui = UiContext::new(global.json, global.verbose, global.color, &config);
    report_warnings("restart", &warnings, ui.json);

    let mut spec = config.launch_spec(&project_dir)?;
    if ui.json && spec.output != OutputMode::Null {
        // stdout carries NDJSON only
        spec = spec.with_output(OutputMode::PrefixedStderr);
    }
    let port = spec.port;

    let mut launcher = SystemLauncher::new();
    let killed = match launcher.reclaim_port(port) {
        Ok(pids) => pids,
        Err(err) => {
            tracing::warn!("could not reclaim port {}: {}", port, err);
            Vec::new()
        }
    };
    if !killed.is_empty() {
        std::thread::sleep(Duration::from_millis(config.restart.settle_ms));
    }

    let pid = SystemLauncher::spawn_detached(&spec)
        .with_context(|| format!("failed to start `{}`", spec.display()))?;

    if ui.json {
        let _ = crate::ui::json::emit(serde_json::json!({
            "event": "complete",
            "command": "restart",
            "pid": pid,
            "port": port,
            "killed": killed,
        }));
    } else {
        if !killed.is_empty() {
            println!(
                "{} Stopped {} process(es) on port {}",
                Icon::Warning.colored(ui.color, ui.unicode),
                killed.len(),
                port
            );
        }
        println!(
            "{} Started `{}` (pid {}) on port {}",
            Icon::Success.colored(ui.color, ui.unicode),
            spec.display(),
            pid,
            port
        );
    }

    Ok(())
}
