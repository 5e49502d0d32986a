use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn gazeselect() -> Command {
    Command::cargo_bin("gazeselect").unwrap()
}

/// Recording with a 0.5 s dwell on cell (2, 4) followed by a glance at the
/// hot corner
fn hot_corner_recording() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
    writeln!(file, "# cell (2, 4), then the trigger corner").unwrap();
    for i in 0..72 {
        let t = i as f64 / 120.0;
        let (x, y) = if t < 0.5 { (0.45, 0.5) } else { (0.75, 0.8) };
        writeln!(
            file,
            r#"{{"channel":"gaze","x":{},"y":{},"timestamp":{},"confidence":0.95}}"#,
            x, y, t
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

fn stdout_json(output: &assert_cmd::assert::Assert) -> serde_json::Value {
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    gazeselect()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    gazeselect()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gazeselect"));
}

#[test]
fn test_help_flag() {
    gazeselect()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("Pupil Capture"));
}

#[test]
fn test_run_requires_participant() {
    gazeselect()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<PARTICIPANT>"));
}

// =============================================================================
// METHODS / FILTERS SUBCOMMANDS
// =============================================================================

#[test]
fn test_methods_table() {
    gazeselect()
        .arg("methods")
        .assert()
        .success()
        .stdout(predicate::str::contains("hotcorner"))
        .stdout(predicate::str::contains("blink"))
        .stdout(predicate::str::contains("head_turn"));
}

#[test]
fn test_methods_json() {
    let output = gazeselect().arg("methods").arg("--json").assert().success();
    let parsed = stdout_json(&output);
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 3);
    let head_turn = arr.iter().find(|m| m["name"] == "head_turn").unwrap();
    assert_eq!(head_turn["dwell_time"].as_f64().unwrap(), 0.4);
}

#[test]
fn test_filters_json() {
    let output = gazeselect().arg("filters").arg("--json").assert().success();
    let parsed = stdout_json(&output);
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 5);
    let defaults: Vec<&str> = arr
        .iter()
        .filter(|f| f["default"].as_bool().unwrap())
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(defaults, vec!["one_euro"]);
}

// =============================================================================
// CONFIG SUBCOMMAND
// =============================================================================

#[test]
fn test_config_defaults() {
    let output = gazeselect().arg("config").assert().success();
    let parsed = stdout_json(&output);
    assert_eq!(parsed["method"], "hotcorner");
    assert_eq!(parsed["grid"]["rows"], 5);
    assert_eq!(parsed["grid"]["cols"], 10);
}

#[test]
fn test_config_overrides() {
    let output = gazeselect()
        .args(["config", "--method", "blink", "--filter", "kalman", "--compact"])
        .assert()
        .success();
    let parsed = stdout_json(&output);
    assert_eq!(parsed["method"], "blink");
    assert_eq!(parsed["filter"]["kind"], "kalman");
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"tick_rate_hz": 120.0, "blink": {{"target": "short"}}}}"#).unwrap();
    file.flush().unwrap();

    let output = gazeselect()
        .arg("config")
        .arg("--config")
        .arg(file.path())
        .assert()
        .success();
    let parsed = stdout_json(&output);
    assert_eq!(parsed["tick_rate_hz"].as_f64().unwrap(), 120.0);
    assert_eq!(parsed["blink"]["target"], "short");
}

#[test]
fn test_config_unknown_filter() {
    gazeselect()
        .args(["config", "--filter", "median"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("median"));
}

#[test]
fn test_config_rejects_unusable_tick_rate() {
    for rate in ["1e-20", "0", "1e9"] {
        gazeselect()
            .args(["config", "--tick-rate", rate])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Tick rate"));
    }
}

// =============================================================================
// REPLAY SUBCOMMAND
// =============================================================================

#[test]
fn test_replay_hot_corner_selection() {
    let recording = hot_corner_recording();
    let output = gazeselect()
        .args(["replay", "p01", "--seed", "42", "--input"])
        .arg(recording.path())
        .assert()
        .success();

    let parsed = stdout_json(&output);
    assert_eq!(parsed["participant"], "p01");
    let trials = parsed["trials"].as_array().unwrap();
    assert_eq!(trials.len(), 1);
    assert_eq!(trials[0]["selection"]["cell"]["row"], 2);
    assert_eq!(trials[0]["selection"]["cell"]["col"], 4);
    assert_eq!(trials[0]["selection"]["method"], "hotcorner");
    assert_eq!(parsed["summary"]["selections"].as_array().unwrap().len(), 1);
    assert!(parsed["log_file"].is_null());
}

#[test]
fn test_replay_without_selection_method_match() {
    // Blink needs blink events; a gaze-only recording selects nothing
    let recording = hot_corner_recording();
    let output = gazeselect()
        .args(["replay", "p01", "--method", "blink", "--input"])
        .arg(recording.path())
        .assert()
        .success();

    let parsed = stdout_json(&output);
    assert!(parsed["trials"].as_array().unwrap().is_empty());
    assert_eq!(parsed["method"], "blink");
}

#[test]
fn test_replay_writes_session_log() {
    let recording = hot_corner_recording();
    let logs = tempfile::TempDir::new().unwrap();
    let out = logs.path().join("report.json");

    gazeselect()
        .args(["replay", "p02", "--seed", "1", "--input"])
        .arg(recording.path())
        .arg("--log-dir")
        .arg(logs.path())
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let log_file = report["log_file"].as_str().unwrap();
    let content = std::fs::read_to_string(log_file).unwrap();
    assert!(content.starts_with("event_type,timestamp,participant"));
    assert!(content.contains("highlighted_cell,"));
    assert!(content.contains("TaskCompleted,"));
}

#[test]
fn test_replay_missing_input() {
    gazeselect()
        .args(["replay", "p01", "--input", "/nonexistent/recording.jsonl"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_replay_malformed_input() {
    let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
    writeln!(file, r#"{{"channel":"gaze","x":0.5,"y":0.5,"timestamp":0.0}}"#).unwrap();
    writeln!(file, r#"{{"channel":"gaze","x":"left"}}"#).unwrap();
    file.flush().unwrap();

    gazeselect()
        .args(["replay", "p01", "--input"])
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_replay_unknown_method() {
    let recording = hot_corner_recording();
    gazeselect()
        .args(["replay", "p01", "--methods", "hotcorner", "wink", "--input"])
        .arg(recording.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("wink"));
}

#[test]
fn test_replay_tiny_tick_rate_is_an_input_error() {
    let recording = hot_corner_recording();
    gazeselect()
        .args(["replay", "p01", "--tick-rate", "1e-20", "--input"])
        .arg(recording.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Tick rate"));
}

#[test]
fn test_replay_rejects_zero_selections_per_method() {
    let recording = hot_corner_recording();
    gazeselect()
        .args(["replay", "p01", "--selections-per-method", "0", "--input"])
        .arg(recording.path())
        .assert()
        .failure()
        .code(1);
}
