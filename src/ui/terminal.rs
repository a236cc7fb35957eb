use is_terminal::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    pub supports_color: bool,
    pub supports_unicode: bool,
    pub is_ci: bool,
}

pub fn detect_capabilities() -> TerminalCapabilities {
    detect_capabilities_impl(
        |key| std::env::var(key).ok(),
        std::io::stdout().is_terminal(),
    )
}

fn detect_capabilities_impl(
    get_env: impl Fn(&str) -> Option<String>,
    is_tty: bool,
) -> TerminalCapabilities {
    let term = get_env("TERM").unwrap_or_default();
    let term_is_dumb = term.eq_ignore_ascii_case("dumb");
    let no_color = get_env("NO_COLOR").is_some_and(|v| !v.is_empty());

    TerminalCapabilities {
        supports_color: is_tty && !term_is_dumb && !no_color,
        supports_unicode: !term_is_dumb && !ascii_locale(&get_env),
        is_ci: is_ci_env(&get_env),
    }
}

fn is_ci_env(get_env: &impl Fn(&str) -> Option<String>) -> bool {
    const KEYS: &[&str] = &["CI", "GITHUB_ACTIONS", "BUILDKITE", "CIRCLECI", "GITLAB_CI"];
    KEYS.iter().any(|k| get_env(k).is_some())
}

/// Only an explicit C/POSIX locale turns unicode off
fn ascii_locale(get_env: &impl Fn(&str) -> Option<String>) -> bool {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .find_map(|k| get_env(k).filter(|v| !v.is_empty()))
        .is_some_and(|v| v == "C" || v == "POSIX")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn caps(env: &[(&str, &str)], is_tty: bool) -> TerminalCapabilities {
        let map: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        detect_capabilities_impl(|k| map.get(k).cloned(), is_tty)
    }

    #[test]
    fn detect_respects_no_color() {
        assert!(!caps(&[("NO_COLOR", "1"), ("TERM", "xterm-256color")], true).supports_color);
        assert!(caps(&[("TERM", "xterm-256color")], true).supports_color);
    }

    #[test]
    fn no_color_when_piped() {
        assert!(!caps(&[("TERM", "xterm")], false).supports_color);
    }

    #[test]
    fn detect_ci_environment() {
        assert!(caps(&[("GITHUB_ACTIONS", "true")], true).is_ci);
        assert!(!caps(&[], true).is_ci);
    }

    #[test]
    fn c_locale_disables_unicode() {
        assert!(!caps(&[("LC_ALL", "C")], true).supports_unicode);
        assert!(caps(&[("LANG", "en_US.UTF-8")], true).supports_unicode);
        assert!(!caps(&[("TERM", "dumb")], true).supports_unicode);
    }
}
