use relaunch::application::{CheckItem, CheckStatus};

use crate::ui::primitives::icon::Icon;

pub fn render_check_item(item: &CheckItem, supports_color: bool, supports_unicode: bool) -> String {
    let icon = match item.status {
        CheckStatus::Pass => Icon::Success,
        CheckStatus::Warning => Icon::Warning,
        CheckStatus::Error => Icon::Error,
    }
    .colored(supports_color, supports_unicode);

    let mut out = format!("  {} {} - {}\n", icon, item.category, item.message);
    if let Some(rec) = &item.recommendation {
        out.push_str(&format!(
            "    {} {}\n",
            Icon::Arrow.colored(supports_color, supports_unicode),
            rec
        ));
    }
    out
}
