//! `relaunch init` writes a template that the loader accepts as-is.

mod common;

use std::fs;

use common::TestEnv;

#[test]
fn init_writes_loadable_template() {
    let env = TestEnv::new();

    let result = env.run(&["init"]);
    assert!(result.success, "init failed: {}", result.stderr);
    assert!(result.stdout.contains("relaunch.toml"));

    let content = fs::read_to_string(env.project_path("relaunch.toml")).unwrap();
    assert!(content.contains("[server]"));
    assert!(content.contains("[watch]"));
    assert!(content.contains("[restart]"));

    let config = relaunch::Config::load(&env.project_path("relaunch.toml")).unwrap();
    assert_eq!(config.server.port, 7861);
    assert_eq!(config.watch.debounce_ms, 2000);
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let env = TestEnv::new();
    env.write_config("[server]\nport = 9000\n");

    let result = env.run(&["init"]);
    assert!(!result.success);
    assert!(
        result.stderr.contains("--force"),
        "expected a hint about --force; got:\n{}",
        result.stderr
    );
    let content = fs::read_to_string(env.project_path("relaunch.toml")).unwrap();
    assert_eq!(content, "[server]\nport = 9000\n");
}

#[test]
fn init_force_overwrites() {
    let env = TestEnv::new();
    env.write_config("[server]\nport = 9000\n");

    let result = env.run(&["init", "--force"]);
    assert!(result.success, "init --force failed: {}", result.stderr);

    let content = fs::read_to_string(env.project_path("relaunch.toml")).unwrap();
    assert!(content.contains("debounce_ms"));
}

#[test]
fn init_json_reports_error_event_when_present() {
    let env = TestEnv::new();
    env.write_config("");

    let result = env.run(&["init", "--json"]);
    assert!(!result.success);

    let events = result.json_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "error");
    assert_eq!(events[0]["command"], "init");
    assert_eq!(events[0]["kind"], "already_exists");
}

#[test]
fn init_json_reports_complete_event() {
    let env = TestEnv::new();

    let result = env.run(&["init", "--json"]);
    assert!(result.success, "init failed: {}", result.stderr);

    let events = result.json_events();
    assert_eq!(events.last().unwrap()["event"], "complete");
    assert_eq!(events.last().unwrap()["command"], "init");
}
