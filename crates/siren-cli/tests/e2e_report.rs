//! E2E CLI tests: report aggregation over snapshot files, transition
//! legality, and policy lookups.
//!
//! Each test runs `sn` as a subprocess against fixtures in a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// A fixed anchor so trend windows and ages are deterministic.
/// 2026-03-04 is a Wednesday.
const NOW: &str = "2026-03-04T12:00:00Z";

/// Build a Command targeting the sn binary, rooted in `dir`.
fn sn_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sn"));
    cmd.current_dir(dir);
    // Suppress tracing output that goes to stderr
    cmd.env("SIREN_LOG", "error");
    cmd
}

/// Write a snapshot file into `dir` and return its path as a string.
fn write_snapshot(dir: &Path, contents: &str) -> String {
    let path = dir.join("snapshot.json");
    std::fs::write(&path, contents).expect("write snapshot");
    path.to_string_lossy().into_owned()
}

/// Run `sn report --json` over a snapshot and return the parsed payload.
fn report_json(dir: &Path, snapshot: &str, extra: &[&str]) -> Value {
    let path = write_snapshot(dir, snapshot);
    let mut args = vec!["report", "--input", path.as_str(), "--now", NOW, "--json"];
    args.extend_from_slice(extra);

    let output = sn_cmd(dir).args(&args).output().expect("report should not crash");
    assert!(
        output.status.success(),
        "report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("report --json should produce valid JSON")
}

const MIXED_SNAPSHOT: &str = r#"[
  {"id": "al-1", "item_type": "network", "level": 5, "status": "pending",
   "created_at": "2026-03-04T08:00:00Z"},
  {"id": "al-2", "item_type": "network", "level": 5, "status": "assigned",
   "created_at": "2026-03-04T09:00:00Z", "first_action_at": "2026-03-04T09:04:00Z"},
  {"id": "al-3", "item_type": "hardware", "level": 4, "status": "pending",
   "created_at": "2026-03-03T22:00:00Z"},
  {"id": "al-4", "level": 2, "status": "closed",
   "created_at": "2026-03-02T10:00:00Z", "first_action_at": "2026-03-02T11:00:00Z",
   "resolved_at": "2026-03-02T15:00:00Z"},
  {"id": "al-5"}
]"#;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[test]
fn report_json_contract_over_mixed_snapshot() {
    let dir = TempDir::new().expect("temp dir");
    let json = report_json(dir.path(), MIXED_SNAPSHOT, &[]);

    assert_eq!(json["total_items"], 5);
    assert_eq!(json["skipped_count"], 1);
    assert_eq!(json["skipped"][0]["id"], "al-5");
    assert_eq!(json["truncated"], false);

    // Distributions cover the four counted rows.
    assert_eq!(json["level_distribution"]["5"], 2);
    assert_eq!(json["type_distribution"]["network"], 2);
    assert_eq!(json["type_distribution"]["other"], 1);
    assert_eq!(json["status_distribution"]["pending"], 2);

    // al-2 responded in 4 minutes (level-5 target is 5); al-4 in 60 minutes
    // (level-2 target is 120). Both compliant.
    assert_eq!(json["sla"]["response"]["measured"], 2);
    assert_eq!(json["sla"]["response"]["rate"], 100);
    // al-4 resolved in 5 hours against the 24-hour default target.
    assert_eq!(json["sla"]["resolution"]["measured"], 1);
    assert_eq!(json["sla"]["resolution"]["rate"], 100);
    assert_eq!(json["sla"]["avg_resolution_hours"], 5.0);

    // Pending + eligible: al-1 (level 5) then al-3 (level 4), snapshot order.
    assert_eq!(json["priority_items"][0]["id"], "al-1");
    assert_eq!(json["priority_items"][0]["needs_escalation"], true);
    assert_eq!(json["priority_items"][0]["age"], "4h 0m");
    assert_eq!(json["priority_items"][1]["id"], "al-3");
    assert_eq!(json["priority_items"].as_array().map(Vec::len), Some(2));

    // Trends: al-1/al-2 today, al-3 yesterday, al-4 inside the week window.
    assert_eq!(json["trends"]["today"], 2);
    assert_eq!(json["trends"]["yesterday"], 1);
    assert_eq!(json["trends"]["week"], 4);

    // Healthy snapshot: no compliance warnings.
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(0));
}

#[test]
fn report_emits_warnings_when_thresholds_breach() {
    let dir = TempDir::new().expect("temp dir");
    // One measured response, six minutes against the level-5 five-minute
    // target: 0% compliance.
    let snapshot = r#"[
      {"id": "al-1", "level": 5, "status": "assigned",
       "created_at": "2026-03-04T09:00:00Z", "first_action_at": "2026-03-04T09:06:00Z"}
    ]"#;

    let json = report_json(dir.path(), snapshot, &[]);
    assert_eq!(json["sla"]["response"]["rate"], 0);

    let warnings = json["warnings"].as_array().expect("warnings array");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["metric"], "response");
    assert_eq!(warnings[0]["value"], 0);
    assert_eq!(warnings[0]["threshold"], 90);
}

#[test]
fn report_limit_flag_caps_the_priority_list() {
    let dir = TempDir::new().expect("temp dir");
    let snapshot = r#"[
      {"id": "a", "level": 5, "status": "pending", "created_at": "2026-03-04T08:00:00Z"},
      {"id": "b", "level": 5, "status": "pending", "created_at": "2026-03-04T08:00:00Z"},
      {"id": "c", "level": 4, "status": "pending", "created_at": "2026-03-04T08:00:00Z"}
    ]"#;

    let json = report_json(dir.path(), snapshot, &["--limit", "1"]);
    let priority = json["priority_items"].as_array().expect("priority array");
    assert_eq!(priority.len(), 1);
    assert_eq!(priority[0]["id"], "a");
}

#[test]
fn report_reads_stdin_and_empty_snapshot_is_vacuously_compliant() {
    let dir = TempDir::new().expect("temp dir");

    let output = sn_cmd(dir.path())
        .args(["report", "--now", NOW, "--json"])
        .write_stdin("[]")
        .output()
        .expect("report should not crash");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["total_items"], 0);
    assert_eq!(json["sla"]["response"]["rate"], 100);
    assert_eq!(json["sla"]["resolution"]["rate"], 100);
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(0));
}

#[test]
fn report_rejects_malformed_snapshot_files() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_snapshot(dir.path(), "{\"not\": \"an array\"}");

    sn_cmd(dir.path())
        .args(["report", "--input", &path, "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid snapshot"));
}

#[test]
fn report_honors_a_config_file() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("siren.toml"),
        "[monitor]\nresponse_min_rate = 100\n",
    )
    .expect("write config");

    // 4 minutes against the level-5 target is compliant, but a 100% floor
    // only tolerates perfection — and this snapshot has one 6-minute breach.
    let snapshot = r#"[
      {"id": "a", "level": 5, "status": "assigned",
       "created_at": "2026-03-04T09:00:00Z", "first_action_at": "2026-03-04T09:04:00Z"},
      {"id": "b", "level": 5, "status": "assigned",
       "created_at": "2026-03-04T09:00:00Z", "first_action_at": "2026-03-04T09:06:00Z"}
    ]"#;

    let json = report_json(dir.path(), snapshot, &[]);
    assert_eq!(json["sla"]["response"]["rate"], 50);

    let warnings = json["warnings"].as_array().expect("warnings array");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["threshold"], 100);
}

// ---------------------------------------------------------------------------
// Transition legality
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_legal_edges() {
    let dir = TempDir::new().expect("temp dir");
    sn_cmd(dir.path())
        .args(["check", "pending", "assigned"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is allowed"));

    let output = sn_cmd(dir.path())
        .args(["check", "pending_verify", "in_progress", "--json"])
        .output()
        .expect("check should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["allowed"], true);
}

#[test]
fn check_rejects_illegal_edges_with_the_allowed_set() {
    let dir = TempDir::new().expect("temp dir");
    sn_cmd(dir.path())
        .args(["check", "pending_verify", "assigned"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid transition"))
        .stderr(predicate::str::contains("closed, in_progress"));

    sn_cmd(dir.path())
        .args(["check", "closed", "pending"])
        .assert()
        .failure();
}

#[test]
fn next_lists_targets_and_marks_terminal_states() {
    let dir = TempDir::new().expect("temp dir");

    let output = sn_cmd(dir.path())
        .args(["next", "in_progress", "--json"])
        .output()
        .expect("next should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["terminal"], false);
    assert_eq!(json["next"][0], "pending_verify");
    assert_eq!(json["next"][1], "closed");

    let output = sn_cmd(dir.path())
        .args(["next", "closed", "--json"])
        .output()
        .expect("next should not crash");
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["terminal"], true);
    assert_eq!(json["next"].as_array().map(Vec::len), Some(0));
}

// ---------------------------------------------------------------------------
// Policy lookups
// ---------------------------------------------------------------------------

#[test]
fn policy_resolves_levels_through_the_catalog() {
    let dir = TempDir::new().expect("temp dir");

    let output = sn_cmd(dir.path())
        .args(["policy", "5", "--json"])
        .output()
        .expect("policy should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["level"], 5);
    assert_eq!(json["response_target_minutes"], 5);
    assert_eq!(json["resolution_target_hours"], 1);
    assert_eq!(json["escalation_eligible"], true);

    // Unknown levels fall back to the default tier instead of failing.
    let output = sn_cmd(dir.path())
        .args(["policy", "9", "--json"])
        .output()
        .expect("policy should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["response_target_minutes"], 120);
    assert_eq!(json["escalation_eligible"], false);
}

#[test]
fn policy_without_a_level_prints_the_catalog() {
    let dir = TempDir::new().expect("temp dir");

    let output = sn_cmd(dir.path())
        .args(["policy", "--json"])
        .output()
        .expect("policy should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["min_level"], 1);
    assert_eq!(json["max_level"], 5);
    assert_eq!(json["tiers"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["default_tier"]["response_target_minutes"], 120);
}
