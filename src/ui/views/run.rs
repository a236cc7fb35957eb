use relaunch::application::SupervisorEvent;

use crate::ui::blocks::header::CommandHeader;
use crate::ui::primitives::icon::Icon;
use crate::ui::primitives::text::ColoredText;
use crate::ui::theme::EVENT_TAG;

pub fn render_run_header(
    command: &str,
    port: u16,
    roots: &[String],
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let mut header = CommandHeader::new(Icon::Watch, "relaunch");
    header.add("Command", command);
    header.add("Port", port.to_string());
    header.add("Watching", roots.join(", "));
    header.add("Hint", "Press Ctrl+C to stop");
    header.render(supports_color, supports_unicode)
}

/// One `[HH:MM:SS] [relaunch:<event>] ...` line
pub fn render_supervisor_event(
    timestamp: &str,
    event: &SupervisorEvent,
    supports_color: bool,
    supports_unicode: bool,
) -> String {
    let tag = ColoredText::dim(format!("[{}:{}]", EVENT_TAG, event.name())).render(supports_color);
    let icon = icon_for(event).colored(supports_color, supports_unicode);
    let message = describe(event);
    let message = if event.is_error() {
        ColoredText::error(message).render(supports_color)
    } else {
        message
    };

    let line = format!("[{}] {} {} {}\n", timestamp, tag, icon, message);
    match event {
        SupervisorEvent::Shutdown { .. } => format!("\n{}", line),
        _ => line,
    }
}

fn icon_for(event: &SupervisorEvent) -> Icon {
    match event {
        SupervisorEvent::SupervisorStarted { .. } => Icon::Watch,
        SupervisorEvent::ProcessRunning { .. } | SupervisorEvent::RestartComplete { .. } => {
            Icon::Success
        }
        SupervisorEvent::ChangeAccepted { .. } => Icon::Arrow,
        SupervisorEvent::TerminationTimeout { .. }
        | SupervisorEvent::RetryScheduled { .. }
        | SupervisorEvent::InboxOverflowed { .. }
        | SupervisorEvent::PortReclaimed { .. } => Icon::Warning,
        SupervisorEvent::ChangeIgnored { .. }
        | SupervisorEvent::ChangeCoalesced { .. }
        | SupervisorEvent::ChangeDebounced { .. }
        | SupervisorEvent::StateChanged { .. } => Icon::Pending,
        e if e.is_error() => Icon::Error,
        _ => Icon::Progress,
    }
}

fn pid(pid: &Option<u32>) -> String {
    match pid {
        Some(pid) => format!("pid {}", pid),
        None => "pid ?".to_string(),
    }
}

fn describe(event: &SupervisorEvent) -> String {
    match event {
        SupervisorEvent::SupervisorStarted {
            server,
            port,
            roots,
            debounce_ms,
        } => format!(
            "watching {} (debounce {}ms); server `{}` on port {}",
            roots.join(", "),
            debounce_ms,
            server,
            port
        ),
        SupervisorEvent::StateChanged { from, to } => format!("{} -> {}", from, to),
        SupervisorEvent::LaunchAttempt {
            attempt,
            max_attempts,
        } => format!("launching server (attempt {}/{})", attempt, max_attempts),
        SupervisorEvent::PortReclaimed { port, pids } => format!(
            "port {} was held by {}; killed",
            port,
            pids.iter()
                .map(|p| format!("pid {}", p))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        SupervisorEvent::ProcessRunning { pid: p, port } => {
            format!("server running ({}) on port {}", pid(p), port)
        }
        SupervisorEvent::LaunchFailed {
            attempt,
            max_attempts,
            reason,
        } => format!("attempt {}/{} failed: {}", attempt, max_attempts, reason),
        SupervisorEvent::RetryScheduled {
            next_attempt,
            delay_ms,
        } => format!("retrying in {}ms (attempt {})", delay_ms, next_attempt),
        SupervisorEvent::StartupAbandoned { attempts } => {
            format!("server failed to start after {} attempts; giving up", attempts)
        }
        SupervisorEvent::ChangeIgnored { path, reason } => {
            format!("ignored {} ({})", path, reason)
        }
        SupervisorEvent::ChangeCoalesced { path } => {
            format!("{} changed; restart already pending", path)
        }
        SupervisorEvent::ChangeDebounced { path } => {
            format!("{} changed inside the debounce window; dropped", path)
        }
        SupervisorEvent::InboxOverflowed { capacity } => format!(
            "more than {} changes queued; treating the overflow as one change",
            capacity
        ),
        SupervisorEvent::ChangeAccepted {
            path,
            kind,
            restart_in_ms,
        } => format!("{} {}; restarting in {}ms", kind, path, restart_in_ms),
        SupervisorEvent::RestartStarted { trigger } => match trigger {
            Some(path) => format!("restarting server ({})", path),
            None => "restarting server".to_string(),
        },
        SupervisorEvent::ProcessStopping { pid: p } => format!("stopping server ({})", pid(p)),
        SupervisorEvent::TerminationTimeout { pid: p, timeout_ms } => format!(
            "{} still running {}ms after terminate; killing",
            pid(p),
            timeout_ms
        ),
        SupervisorEvent::ProcessStopped { pid: p, forced } => {
            if *forced {
                format!("server killed ({})", pid(p))
            } else {
                format!("server stopped ({})", pid(p))
            }
        }
        SupervisorEvent::RestartComplete { pid: p, restarts } => {
            format!("restart #{} complete ({})", restarts, pid(p))
        }
        SupervisorEvent::RestartAbandoned { attempts } => format!(
            "restart failed after {} attempts; still watching for changes",
            attempts
        ),
        SupervisorEvent::ProcessExited { pid: p } => format!(
            "server exited unexpectedly ({}); the next change relaunches it",
            pid(p)
        ),
        SupervisorEvent::WatchSourceError { message } => format!("watch error: {}", message),
        SupervisorEvent::Shutdown { restarts } => {
            format!("stopped after {} restart(s)", restarts)
        }
    }
}
