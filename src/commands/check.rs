use anyhow::Result;
use relaunch::application::CheckUseCase;
use relaunch::config::config_source;
use relaunch::infrastructure::PortProbe;

use super::{load_config, project_dir, GlobalArgs};
use crate::ui::context::UiContext;
use crate::ui::views::check::{render_check_header, render_check_report, render_check_summary};

pub fn cmd_check(global: &GlobalArgs) -> Result<()> {
    let project_dir = project_dir()?;
    let (config, warnings) = load_config(global, &project_dir)?;
    let ui = UiContext::new(global.json, global.verbose, global.color, &config);

    if !ui.json {
        let source = match config_source(global.config.as_deref(), &project_dir) {
            Some(path) => path
                .strip_prefix(&project_dir)
                .unwrap_or(&path)
                .display()
                .to_string(),
            None => "defaults".to_string(),
        };
        print!(
            "{}",
            render_check_header(&source, config.server.port, ui.color, ui.unicode)
        );
    }

    let use_case = CheckUseCase::new(&config, &project_dir, |port| PortProbe::new(port).is_free());
    let result = if ui.json {
        use_case.execute_with_callback(&warnings, |item| {
            let mut value = serde_json::to_value(item).unwrap_or_default();
            if let Some(obj) = value.as_object_mut() {
                obj.insert("event".to_string(), serde_json::json!("check"));
                obj.insert("command".to_string(), serde_json::json!("check"));
            }
            let _ = crate::ui::json::emit(value);
        })
    } else {
        let result = use_case.execute(&warnings);
        print!("{}", render_check_report(&result, ui.color, ui.unicode));
        result
    };

    if ui.json {
        let _ = crate::ui::json::emit(serde_json::json!({
            "event": "complete",
            "command": "check",
            "passed": result.passed,
            "warnings": result.warnings,
            "errors": result.errors,
            "success": result.is_success(),
        }));
    } else {
        print!("{}", render_check_summary(&result, ui.color, ui.unicode));
    }

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
