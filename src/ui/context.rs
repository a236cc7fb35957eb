use crate::ui::terminal::{detect_capabilities, TerminalCapabilities};
use relaunch::application::SupervisorEvent;
use relaunch::config::{ColorMode, Config, Verbosity};
use relaunch::presentation::ColorWhen;

/// Rendering decisions for one command invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiContext {
    pub json: bool,
    pub verbosity: Verbosity,
    pub color: bool,
    pub unicode: bool,
}

impl UiContext {
    pub fn new(json: bool, verbose: u8, cli_color: Option<ColorWhen>, config: &Config) -> Self {
        Self::from_caps(json, verbose, cli_color, config, detect_capabilities())
    }

    pub(crate) fn from_caps(
        json: bool,
        verbose: u8,
        cli_color: Option<ColorWhen>,
        config: &Config,
        caps: TerminalCapabilities,
    ) -> Self {
        let color = match cli_color {
            Some(ColorWhen::Never) => false,
            Some(ColorWhen::Always) => true,
            Some(ColorWhen::Auto) | None => match config.output.color {
                ColorMode::Never => false,
                ColorMode::Always => true,
                ColorMode::Auto => caps.supports_color && !caps.is_ci,
            },
        };

        let from_flag = match verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        };
        let verbosity = if verbose > 0 {
            from_flag.max(config.output.verbosity)
        } else {
            config.output.verbosity
        };

        Self {
            json,
            verbosity,
            color: color && !json,
            unicode: caps.supports_unicode,
        }
    }

    /// Whether a human-readable line is printed for `event`
    pub fn shows(&self, event: &SupervisorEvent) -> bool {
        match self.verbosity {
            Verbosity::Quiet => {
                event.is_error()
                    || matches!(
                        event,
                        SupervisorEvent::SupervisorStarted { .. }
                            | SupervisorEvent::RestartComplete { .. }
                            | SupervisorEvent::Shutdown { .. }
                    )
            }
            Verbosity::Normal => !event.is_change_noise(),
            Verbosity::Verbose | Verbosity::Debug => true,
        }
    }
}
