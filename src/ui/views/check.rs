use relaunch::application::CheckResult;

use crate::ui::blocks::check_item::render_check_item;
use crate::ui::blocks::header::CommandHeader;
use crate::ui::primitives::icon::Icon;
use crate::ui::primitives::text::ColoredText;

pub fn render_check_header(
    config_source: &str,
    port: u16,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let mut header = CommandHeader::new(Icon::Check, "relaunch check");
    header.add("Config", config_source);
    header.add("Port", port.to_string());
    header.render(supports_color, supports_unicode)
}

pub fn render_check_report(result: &CheckResult, supports_color: bool, supports_unicode: bool) -> String {
    let mut out = String::new();
    for item in &result.items {
        out.push_str(&render_check_item(item, supports_color, supports_unicode));
    }
    out
}

pub fn render_check_summary(result: &CheckResult, supports_color: bool, supports_unicode: bool) -> String {
    let (icon, title) = if !result.is_success() {
        (Icon::Error, ColoredText::error("Check FAILED"))
    } else if !result.is_clean() {
        (Icon::Warning, ColoredText::warning("Check passed with warnings"))
    } else {
        (Icon::Success, ColoredText::success("All checks passed"))
    };
    format!(
        "\n{} {}: {} passed, {} warning(s), {} error(s)\n",
        icon.colored(supports_color, supports_unicode),
        title.bold().render(supports_color),
        result.passed,
        result.warnings,
        result.errors
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaunch::application::{CheckItem, CheckStatus};

    fn result(statuses: &[CheckStatus]) -> CheckResult {
        let mut result = CheckResult::default();
        for status in statuses {
            match status {
                CheckStatus::Pass => result.passed += 1,
                CheckStatus::Warning => result.warnings += 1,
                CheckStatus::Error => result.errors += 1,
            }
            result.items.push(CheckItem {
                category: "watch".to_string(),
                name: "root".to_string(),
                status: *status,
                message: "watching /srv/app".to_string(),
                recommendation: None,
            });
        }
        result
    }

    #[test]
    fn summary_reports_failure() {
        let rendered = render_check_summary(&result(&[CheckStatus::Pass, CheckStatus::Error]), false, false);
        assert_eq!(rendered, "\n[FAIL] Check FAILED: 1 passed, 0 warning(s), 1 error(s)\n");
    }

    #[test]
    fn summary_reports_clean_run() {
        let rendered = render_check_summary(&result(&[CheckStatus::Pass]), false, true);
        assert!(rendered.contains("All checks passed"));
    }

    #[test]
    fn report_has_one_line_per_item() {
        let rendered = render_check_report(&result(&[CheckStatus::Pass, CheckStatus::Warning]), false, false);
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.contains("[WARN] watch - watching /srv/app"));
    }
}
