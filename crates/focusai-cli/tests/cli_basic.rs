//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with its own config directory so nothing
//! touches the real `~/.config/focusai`.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(config_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusai-cli"))
        .args(args)
        .env("FOCUSAI_CONFIG_DIR", config_dir)
        .env_remove("FOCUSAI_API_URL")
        .env_remove("FOCUSAI_TOKEN")
        .env_remove("FOCUSAI_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help_lists_command_groups() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["--help"]);
    assert_eq!(code, 0);
    for group in ["task", "alerts", "config"] {
        assert!(stdout.contains(group), "help is missing '{group}'");
    }
}

#[test]
fn test_config_defaults_are_written() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "alerts.poll_interval_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "60");
    assert!(dir.path().join("config.toml").exists());

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "api.base_url"]);
    assert_eq!(stdout.trim(), "http://localhost:5001");
}

#[test]
fn test_config_set_persists() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "alerts.countdown_secs", "20"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "alerts.snooze_options", "[5,30]"]);
    assert_eq!(code, 0);

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "alerts.countdown_secs"]);
    assert_eq!(stdout.trim(), "20");
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "alerts.snooze_options"]);
    assert_eq!(stdout.trim(), "[5,30]");

    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "alerts.countdown_secs"]);
    assert_eq!(stdout.trim(), "10");
}

#[test]
fn test_config_rejects_unknown_and_invalid_values() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "alerts.volume", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key: alerts.volume"));

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "alerts.poll_interval_secs", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("alerts.poll_interval_secs"));

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_is_json() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["alerts"]["retention"], "pending_only");
}

#[test]
fn test_alerts_check_demo_json() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["alerts", "check", "--demo", "--json"]);
    assert_eq!(code, 0);

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let fired = report["fired"].as_array().unwrap();
    assert_eq!(fired.len(), 3);
    assert_eq!(fired[0]["severity"], "critical");
    assert_eq!(fired[0]["minutesUntilDue"], 4);
    assert_eq!(fired[2]["severity"], "warning");
}

#[test]
fn test_alerts_check_demo_text() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["alerts", "check", "--demo"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[critical] Send invoice to client"));
    assert!(!stdout.contains("Plan next sprint"));
}

#[test]
fn test_unreachable_api_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "api.base_url", "http://127.0.0.1:9"]);
    assert_eq!(code, 0);

    let (_, stderr, code) = run_cli(dir.path(), &["alerts", "check"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_invalid_priority_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["task", "list", "--priority", "urgent"]);
    assert_eq!(code, 2);
}
