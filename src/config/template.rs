//! Commented config written by `relaunch init`

pub const CONFIG_TEMPLATE: &str = r#"# relaunch configuration
# Every key is optional; the values below are the defaults.

[server]
# Command to run, as a string or an argv array
command = ["python", "app.py"]
# working_dir = "."
port = 7861
# Milliseconds a fresh process must survive to count as started
startup_grace_ms = 3000
# Require the port to accept connections before the grace window ends
probe_port = false
# Kill whatever still listens on the port before each launch (Unix, uses lsof)
reclaim_port = false
# Files `relaunch check` expects to exist
required_files = []

[server.env]
# PYTHONUNBUFFERED = "1"

[watch]
roots = ["."]
extensions = ["py", "css"]
# Path segments (or file suffixes, when starting with '.') that never trigger a restart
exclude = ["__pycache__", ".pyc"]
debounce_ms = 2000

[restart]
terminate_timeout_ms = 5000
# Pause between stopping the old server and starting the new one
settle_ms = 2000
max_attempts = 3
# fixed or exponential
backoff = "fixed"
backoff_ms = 3000

[output]
# quiet, normal, verbose, debug
verbosity = "normal"
# auto, always, never
color = "auto"
prefix_server_output = true
"#;
