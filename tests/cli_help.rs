use std::process::Command;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_relaunch")
}

#[test]
fn test_help_lists_commands_and_init_hint() {
    let output = Command::new(bin()).arg("--help").output().unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["run", "restart", "check", "init"] {
        assert!(
            stdout.contains(command),
            "help output should list `{}`; got:\n{}",
            command,
            stdout
        );
    }
    assert!(
        stdout.contains("Run 'relaunch init' to write a relaunch.toml template."),
        "help output should point at init; got:\n{}",
        stdout
    );
}

#[test]
fn test_run_help_documents_trailing_command() {
    let output = Command::new(bin()).args(["run", "--help"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--debounce-ms"));
    assert!(stdout.contains("<COMMAND>"), "got:\n{}", stdout);
}

#[test]
fn test_version_flag() {
    let output = Command::new(bin()).arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("relaunch "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
