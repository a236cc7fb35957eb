use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use relaunch::application::{Supervisor, SupervisorEvent};
use relaunch::domain::ports::OutputMode;
use relaunch::infrastructure::{InstanceLock, NotifySource, SystemLauncher};
use relaunch::presentation::ServerArgs;

use super::{load_config, project_dir, report_warnings, GlobalArgs};
use crate::ui::context::UiContext;
use crate::ui::views::run::{render_run_header, render_supervisor_event};

/// CLI overrides for `relaunch run`
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub server: ServerArgs,
    pub debounce_ms: Option<u64>,
    pub watch: Vec<PathBuf>,
    pub ext: Vec<String>,
}

pub fn cmd_run(global: &GlobalArgs, args: &RunArgs) -> Result<()> {
    let project_dir = project_dir()?;
    let (mut config, warnings) = load_config(global, &project_dir)?;

    args.server.apply(&mut config);
    if let Some(debounce_ms) = args.debounce_ms {
        config.watch.debounce_ms = debounce_ms;
    }
    if !args.watch.is_empty() {
        config.watch.roots = args.watch.clone();
    }
    if !args.ext.is_empty() {
        config.watch.extensions = args.ext.clone();
    }

    let ui = UiContext::new(global.json, global.verbose, global.color, &config);
    report_warnings("run", &warnings, ui.json);

    let mut options = config.supervisor_options(&project_dir)?;
    if ui.json && options.launch.output != OutputMode::Null {
        // stdout carries NDJSON only
        options.launch = options.launch.with_output(OutputMode::PrefixedStderr);
    }

    let _lock = InstanceLock::acquire(options.port())?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("failed to install the Ctrl+C handler")?;

    if !ui.json {
        let roots: Vec<String> = options.roots.iter().map(|r| r.to_string()).collect();
        print!(
            "{}",
            render_run_header(
                &options.launch.display(),
                options.port(),
                &roots,
                ui.color,
                ui.unicode
            )
        );
    }

    tracing::debug!(
        "restart budget per change: {}ms",
        options.restart_budget().as_millis()
    );

    let mut supervisor = Supervisor::new(
        options,
        SystemLauncher::new(),
        NotifySource::new(),
        move |event| render_event(&ui, &event),
    )
    .with_running_flag(running);

    supervisor.run()?;
    Ok(())
}

fn render_event(ui: &UiContext, event: &SupervisorEvent) {
    if ui.json {
        let _ = crate::ui::json::emit_line(&event.to_json());
        return;
    }
    if !ui.shows(event) {
        return;
    }

    let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
    let rendered = render_supervisor_event(&timestamp, event, ui.color, ui.unicode);
    if event.is_error() {
        eprint!("{rendered}");
    } else {
        print!("{rendered}");
        let _ = std::io::stdout().flush();
    }
}
