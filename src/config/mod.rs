//! Configuration module for relaunch
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (RELAUNCH_*)
//! 3. `--config <file>` or project config (./relaunch.toml)
//! 4. User config (~/.config/relaunch/config.toml)
//! 5. Built-in defaults (lowest priority)

mod env_validator;
mod loader;
mod template;
mod types;

pub use env_validator::{levenshtein, EnvVarValidator};
pub use loader::{config_source, user_config_path, ConfigWarning, PROJECT_CONFIG_FILE};
pub use template::CONFIG_TEMPLATE;
pub use types::{
    BackoffKind, ColorMode, CommandLine, Config, OutputConfig, RestartConfig, ServerConfig,
    Verbosity, WatchConfig,
};
