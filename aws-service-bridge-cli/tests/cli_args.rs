use predicates::prelude::*;
use std::process::{Command, Stdio};

fn bridge() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_aws-service-bridge"));
    // Keep the environment from supplying configuration
    for var in [
        "ATHENA_DATABASE",
        "ATHENA_OUTPUT_LOCATION",
        "ATHENA_WORKGROUP",
        "IOT_ENDPOINT",
        "BRIDGE_MAX_POLLS",
        "BRIDGE_TIMEOUT_SECS",
        "BRIDGE_POLL_INTERVAL_MS",
    ] {
        command.env_remove(var);
    }
    command.stdin(Stdio::null());
    command
}

#[test]
fn help_lists_subcommands() {
    let out = bridge()
        .arg("--help")
        .output()
        .expect("failed to run --help");
    let s = String::from_utf8_lossy(&out.stdout);
    for subcommand in ["query", "publish", "listen", "serve"] {
        assert!(s.contains(subcommand), "help should list {subcommand}: {s}");
    }
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn test_query_with_blank_sql_is_invalid_input() {
    let output = bridge()
        .args(["query", "   "])
        .output()
        .expect("failed to run query");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Query must not be empty"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn test_query_with_empty_stdin_is_invalid_input() {
    let output = bridge()
        .arg("query")
        .output()
        .expect("failed to run query with empty stdin");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_query_without_athena_settings_is_a_config_error() {
    let output = bridge()
        .args(["query", "SELECT 1", "--region", "us-east-1"])
        .output()
        .expect("failed to run query without settings");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Athena"), "stderr was: {}", stderr);
}

#[test]
fn test_query_with_partial_athena_settings_is_rejected() {
    let output = bridge()
        .args(["query", "SELECT 1", "--database", "analytics"])
        .output()
        .expect("failed to run query with partial settings");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--output-location"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn test_publish_rejects_wildcard_topic() {
    assert_cmd::Command::cargo_bin("aws-service-bridge")
        .unwrap()
        .env_remove("IOT_ENDPOINT")
        .args(["publish", "--topic", "fleet/+/state", "hello"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Wildcards"));
}

#[test]
fn test_publish_rejects_unsupported_qos() {
    let output = bridge()
        .args([
            "publish",
            "--topic",
            "fleet/truck/1/state",
            "--qos",
            "2",
            "hello",
        ])
        .output()
        .expect("failed to run publish");

    // clap usage errors exit with 2
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--qos"), "stderr was: {}", stderr);
}

#[test]
fn test_listen_rejects_invalid_filter() {
    let output = bridge()
        .args(["listen", "--filter", "fleet/#/state"])
        .output()
        .expect("failed to run listen");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fleet/#/state"), "stderr was: {}", stderr);
}

#[test]
fn test_listen_without_endpoint_is_a_config_error() {
    let output = bridge()
        .arg("listen")
        .output()
        .expect("failed to run listen");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("IoT endpoint"), "stderr was: {}", stderr);
}
