//! End-to-end tests for the `tokenvest` binary.
//!
//! Each test writes its inputs to a temporary directory, runs the compiled
//! binary, and inspects stdout. Logs go to stderr and are ignored.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

const ADMIN: &str = "0xad000000000000000000000000000000000000ad";
const MANAGER: &str = "0x3a0000000000000000000000000000000000003a";
const CUSTODY: &str = "0xcc000000000000000000000000000000000000cc";
const ALICE: &str = "0xa100000000000000000000000000000000000001";

/// Helper: runs the binary with `RUST_LOG` silenced.
fn tokenvest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tokenvest"))
        .args(args)
        .env("RUST_LOG", "off")
        .env_remove("TOKENVEST_CONFIG")
        .output()
        .expect("failed to run tokenvest")
}

fn write_json(dir: &Path, name: &str, value: &Value) -> String {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

/// First JSON document on stdout. `--metrics` appends plain text after it.
fn stdout_json(output: &Output) -> Value {
    let text = String::from_utf8(output.stdout.clone()).unwrap();
    let mut stream = serde_json::Deserializer::from_str(&text).into_iter::<Value>();
    stream.next().unwrap().unwrap()
}

fn scenario() -> Value {
    json!({
        "custody": CUSTODY,
        "custody_funding": 100000,
        "roles": [
            { "address": ADMIN, "capabilities": ["admin"] },
            { "address": MANAGER, "capabilities": ["schedule_manager"] }
        ],
        "steps": [
            { "at": "2026-03-01T00:00:00Z", "caller": MANAGER, "op": "add_schedule",
              "beneficiary": ALICE, "amount": 12000, "start": "2026-03-01T00:00:00Z",
              "cliff_days": 30, "duration_days": 365, "category": "team" },
            { "at": "2026-05-13T00:00:00Z", "caller": ALICE, "op": "release",
              "beneficiary": ALICE },
            { "at": "2026-05-14T00:00:00Z", "caller": ALICE, "op": "revoke",
              "beneficiary": ALICE }
        ]
    })
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_prints_steps_and_report() {
    let dir = TempDir::new().unwrap();
    let path = write_json(dir.path(), "scenario.json", &scenario());

    let output = tokenvest(&["simulate", "--scenario", &path]);
    assert!(output.status.success());

    let result = stdout_json(&output);
    let steps = result["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0]["ok"], true);
    assert_eq!(steps[1]["result"]["amount"], 2400);
    assert_eq!(steps[2]["ok"], false);
    assert_eq!(result["report"]["total_released"], 2400);
    assert_eq!(result["report"]["schedule_count"], 1);
}

#[test]
fn strict_simulate_fails_on_a_failed_step() {
    let dir = TempDir::new().unwrap();
    let path = write_json(dir.path(), "scenario.json", &scenario());

    let output = tokenvest(&["simulate", "--scenario", &path, "--strict"]);
    assert!(!output.status.success());
}

#[test]
fn simulate_can_append_prometheus_metrics() {
    let dir = TempDir::new().unwrap();
    let path = write_json(dir.path(), "scenario.json", &scenario());

    let output = tokenvest(&["simulate", "--scenario", &path, "--metrics"]);
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("tokenvest_releases_total 1"));
    assert!(text.contains("tokenvest_total_released 2400"));
    assert!(text.contains("tokenvest_category_allocated{category=\"team\"} 12000"));
}

#[test]
fn simulate_honours_a_config_file() {
    let dir = TempDir::new().unwrap();
    let mut config: Value =
        serde_json::from_slice(&tokenvest(&["config"]).stdout).unwrap();
    for entry in config["categories"].as_array_mut().unwrap() {
        if entry["category"] == "team" {
            entry["max_allocation"] = json!(10000);
        }
    }
    let config_path = write_json(dir.path(), "config.json", &config);
    let scenario_path = write_json(dir.path(), "scenario.json", &scenario());

    let output = tokenvest(&[
        "simulate",
        "--scenario",
        &scenario_path,
        "--config",
        &config_path,
    ]);
    assert!(output.status.success());

    let result = stdout_json(&output);
    assert_eq!(result["steps"][0]["ok"], false);
    assert!(result["steps"][0]["error"]
        .as_str()
        .unwrap()
        .contains("allocation exceeded"));
}

#[test]
fn malformed_scenario_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let output = tokenvest(&["simulate", "--scenario", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to parse scenario file"));
}

// ---------------------------------------------------------------------------
// quote / config
// ---------------------------------------------------------------------------

#[test]
fn quote_matches_linear_vesting() {
    let output = tokenvest(&[
        "quote",
        "--amount",
        "12000",
        "--start",
        "2026-03-01T00:00:00Z",
        "--cliff-days",
        "30",
        "--duration-days",
        "365",
        "--at",
        "2026-03-16T00:00:00Z",
    ]);
    assert!(output.status.success());
    let quote = stdout_json(&output);
    assert_eq!(quote["releasable"], 0);
    assert_eq!(quote["vested"], 12_000 * 15 / 365);

    let output = tokenvest(&[
        "quote",
        "--amount",
        "12000",
        "--start",
        "2026-03-01T00:00:00Z",
        "--duration-days",
        "365",
        "--at",
        "2027-06-01T00:00:00Z",
        "--released",
        "5000",
    ]);
    let quote = stdout_json(&output);
    assert_eq!(quote["vested"], 12000);
    assert_eq!(quote["releasable"], 7000);
}

#[test]
fn quote_rejects_cliff_past_duration() {
    let output = tokenvest(&[
        "quote",
        "--amount",
        "100",
        "--cliff-days",
        "40",
        "--duration-days",
        "30",
    ]);
    assert!(!output.status.success());
}

#[test]
fn config_prints_every_category() {
    let output = tokenvest(&["config"]);
    assert!(output.status.success());
    let config = stdout_json(&output);
    assert_eq!(config["categories"].as_array().unwrap().len(), 6);
    assert_eq!(config["global_vesting_start"], "2026-01-01T00:00:00Z");
}
