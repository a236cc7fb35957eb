use std::fs;

use anyhow::{bail, Context, Result};
use relaunch::config::{Config, CONFIG_TEMPLATE, PROJECT_CONFIG_FILE};

use super::{project_dir, GlobalArgs};
use crate::ui::context::UiContext;
use crate::ui::primitives::icon::Icon;

/// Write a commented relaunch.toml into the current directory
pub fn cmd_init(global: &GlobalArgs, force: bool) -> Result<()> {
    let path = project_dir()?.join(PROJECT_CONFIG_FILE);
    let ui = UiContext::new(global.json, global.verbose, global.color, &Config::default());

    if path.exists() && !force {
        if ui.json {
            let _ = crate::ui::json::emit(serde_json::json!({
                "event": "error",
                "command": "init",
                "kind": "already_exists",
                "path": path.display().to_string(),
                "message": "relaunch.toml already exists"
            }));
        }
        bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if ui.json {
        let _ = crate::ui::json::emit(serde_json::json!({
            "event": "complete",
            "command": "init",
            "path": path.display().to_string(),
        }));
    } else {
        println!(
            "{} Created {}",
            Icon::Success.colored(ui.color, ui.unicode),
            path.display()
        );
        println!();
        println!(
            "{} Next: set [server].command, then run `relaunch check` and `relaunch run`",
            Icon::Arrow.colored(ui.color, ui.unicode)
        );
    }

    Ok(())
}
