//! CLI integration tests

use std::process::{Command, Output};

use tempfile::TempDir;

/// Run the CLI with an isolated home directory so no user config leaks in
fn run(args: &[&str]) -> (Output, TempDir) {
    let home = TempDir::new().expect("Failed to create temp home");
    let output = Command::new(env!("CARGO_BIN_EXE_dmon"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("DMON_API_URL")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command");
    (output, home)
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let (output, _home) = run(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("deploy dashboard monitor"),
        "Should show app name"
    );
    for command in ["status", "alerts", "ack", "simulate", "stop", "session", "classify"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let (output, _home) = run(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("dmon"), "Should show binary name");
}

/// Test format and api-url options
#[test]
fn test_global_options() {
    let (output, _home) = run(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("DMON_API_URL"), "Should show env var");
}

#[test]
fn test_simulate_help() {
    let (output, _home) = run(&["simulate", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Simulate help should succeed");
    assert!(stdout.contains("--duration"), "Should show duration option");
}

#[test]
fn test_unknown_scenario_rejected() {
    let (output, _home) = run(&["simulate", "meltdown"]);

    assert!(!output.status.success(), "Unknown scenario should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("meltdown"), "Should name the bad scenario");
}

/// Classification runs locally without a server
#[test]
fn test_classify_offline_json() {
    let (output, _home) = run(&[
        "--format",
        "json",
        "classify",
        "--cpu",
        "95",
        "--latency",
        "100",
        "--error-rate",
        "0.5",
    ]);

    assert!(output.status.success(), "Classify should succeed offline");
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    assert_eq!(value["healthState"], "danger");
    assert_eq!(value["mood"], "crying");
    assert_eq!(value["healthScore"], 50);
}

#[test]
fn test_classify_offline_table() {
    let (output, _home) = run(&[
        "classify",
        "--cpu",
        "10",
        "--latency",
        "50",
        "--error-rate",
        "0",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Classify should succeed offline");
    assert!(stdout.contains("healthy"), "Should show the health state");
    assert!(stdout.contains("CPU"), "Should show channel rows");
}

#[test]
fn test_scenarios_listed() {
    let (output, _home) = run(&["scenarios"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for name in ["cpu_spike", "high_latency", "error_burst"] {
        assert!(stdout.contains(name), "Should list {}", name);
    }
}

#[test]
fn test_status_against_server() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/v1/monitoring")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "session": "session-42",
                "metrics": {"cpuUsage": 88.0, "latency": 120.0, "errorRate": 0.2,
                            "timestamp": "2024-01-01T00:00:00Z"},
                "classification": {"healthScore": 40, "healthState": "danger",
                                   "mood": "crying", "coachMessage": "CPU is on fire"},
                "alerts": [],
                "simulation": null
            }"#,
        )
        .create();

    let (output, _home) = run(&["--api-url", &server.url(), "status"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    mock.assert();
    assert!(output.status.success(), "Status should succeed");
    assert!(stdout.contains("session-42"));
    assert!(stdout.contains("CPU is on fire"));
}

#[test]
fn test_api_error_is_reported() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/api/v1/monitoring/simulate/start")
        .with_status(409)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "no monitoring session attached", "code": "no_session"}"#)
        .create();

    let (output, _home) = run(&["--api-url", &server.url(), "simulate", "cpu_spike"]);

    assert!(!output.status.success(), "Conflict should fail the command");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no_session"), "Should surface the error code");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let (output, _home) = run(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let (output, _home) = run(&["ack"]);

    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}
