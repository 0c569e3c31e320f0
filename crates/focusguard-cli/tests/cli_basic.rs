//! Basic CLI E2E tests.
//!
//! Tests invoke the built CLI binary with an isolated home directory.

mod common;

use common::{assert_json_field, parse_json, run_cli_failure, run_cli_success};

#[test]
fn test_platform() {
    let home = tempfile::tempdir().unwrap();
    let output = run_cli_success(home.path(), &["platform"]);
    assert!(output.contains("Grant permissions on"));
}

#[test]
fn test_permissions_check_json() {
    let home = tempfile::tempdir().unwrap();
    let output = run_cli_success(home.path(), &["permissions", "check", "--json"]);
    let json = parse_json(&output);
    assert_json_field(&json, "status");
    assert_eq!(json["isLoading"], serde_json::Value::Bool(false));
    assert_json_field(&json["status"], "overallStatus");
}

#[test]
fn test_permissions_check_with_writable_hosts_override() {
    let home = tempfile::tempdir().unwrap();
    let hosts = home.path().join("hosts");
    std::fs::write(&hosts, "127.0.0.1 localhost\n").unwrap();
    let hosts_arg = hosts.to_string_lossy().to_string();

    run_cli_success(home.path(), &["config", "set", "permissions.hosts_path", &hosts_arg]);
    let output = run_cli_success(home.path(), &["permissions", "check", "--json"]);
    let json = parse_json(&output);
    assert_eq!(json["status"]["hostsFileWritable"], serde_json::Value::Bool(true));
}

#[test]
fn test_clearing_hosts_override_restores_platform_default() {
    let home = tempfile::tempdir().unwrap();
    let hosts = home.path().join("hosts");
    std::fs::write(&hosts, "127.0.0.1 localhost\n").unwrap();
    let hosts_arg = hosts.to_string_lossy().to_string();

    run_cli_success(home.path(), &["config", "set", "permissions.hosts_path", &hosts_arg]);
    run_cli_success(home.path(), &["config", "set", "permissions.hosts_path", ""]);

    let value = run_cli_success(home.path(), &["config", "get", "permissions.hosts_path"]);
    assert_eq!(value.trim(), "null");

    let output = run_cli_success(home.path(), &["permissions", "check", "--json"]);
    let json = parse_json(&output);
    if let Some(error) = json["status"]["hostsFileError"].as_str() {
        assert!(!error.contains("Cannot open  for"), "probed an empty path: {error}");
        assert!(!error.contains(&hosts_arg));
        if cfg!(unix) {
            assert!(error.contains("/etc/hosts"), "unexpected hosts error: {error}");
        }
    }
}

#[test]
fn test_permissions_explain_for_macos() {
    let home = tempfile::tempdir().unwrap();
    let output = run_cli_success(
        home.path(),
        &["permissions", "explain", "--json", "--platform", "macos"],
    );
    let json = parse_json(&output);
    assert_eq!(json["platform"], "macos");
    assert_eq!(json["open"], serde_json::Value::Bool(true));
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_suppression_set_show_clear() {
    let home = tempfile::tempdir().unwrap();
    let initial = run_cli_success(home.path(), &["permissions", "suppression", "show"]);
    assert_eq!(initial.trim(), "not suppressed");

    run_cli_success(home.path(), &["permissions", "suppression", "set"]);
    let shown = run_cli_success(home.path(), &["permissions", "suppression", "show"]);
    assert_eq!(shown.trim(), "suppressed");

    run_cli_success(home.path(), &["permissions", "suppression", "clear"]);
    let cleared = run_cli_success(home.path(), &["permissions", "suppression", "show"]);
    assert_eq!(cleared.trim(), "not suppressed");
}

#[test]
fn test_config_get_default_timeout() {
    let home = tempfile::tempdir().unwrap();
    let output = run_cli_success(home.path(), &["config", "get", "permissions.check_timeout_secs"]);
    assert_eq!(output.trim(), "10");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, _) = run_cli_failure(home.path(), &["config", "set", "ui.nope", "1"]);
    assert!(stderr.contains("error:"));
}
