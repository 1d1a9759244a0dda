//! Integration tests for the `calsvc` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the offline `slots`
//! subcommand end to end, plus argument and configuration errors of the online
//! subcommands that surface before any network access.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the free/busy calendar fixture.
fn freebusy_fixture_path() -> &'static str {
    concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/freebusy_calendar.json"
    )
}

fn calsvc() -> Command {
    let mut cmd = Command::cargo_bin("calsvc").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// slots subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn slots_from_stdin_array() {
    let input = r#"[{"start":"2026-03-03T10:00:00Z","end":"2026-03-03T11:00:00Z"}]"#;

    calsvc()
        .args(["slots", "--from", "2026-03-03T09:00:00Z", "--to", "2026-03-03T12:00:00Z"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2026-03-03T09:00:00+00:00 - 2026-03-03T10:00:00+00:00 (60 min)",
        ))
        .stdout(predicate::str::contains(
            "2026-03-03T11:00:00+00:00 - 2026-03-03T12:00:00+00:00 (60 min)",
        ));
}

#[test]
fn slots_from_freebusy_file() {
    calsvc()
        .args([
            "slots",
            "--from",
            "2026-03-03T08:00:00Z",
            "--to",
            "2026-03-03T17:00:00Z",
            "-i",
            freebusy_fixture_path(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("(60 min)"))
        .stdout(predicate::str::contains(
            "2026-03-03T11:00:00+00:00 - 2026-03-03T13:00:00+00:00 (120 min)",
        ))
        .stdout(predicate::str::contains(
            "2026-03-03T14:00:00+00:00 - 2026-03-03T17:00:00+00:00 (180 min)",
        ));
}

#[test]
fn slots_min_duration_filters_short_gaps() {
    calsvc()
        .args([
            "slots",
            "--from",
            "2026-03-03T08:00:00Z",
            "--to",
            "2026-03-03T17:00:00Z",
            "--min-duration",
            "150",
            "-i",
            freebusy_fixture_path(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("(180 min)"))
        .stdout(predicate::str::contains("(60 min)").not())
        .stdout(predicate::str::contains("(120 min)").not());
}

#[test]
fn slots_json_report() {
    let output = calsvc()
        .args([
            "slots",
            "--from",
            "2026-03-03T08:00:00Z",
            "--to",
            "2026-03-03T17:00:00Z",
            "--json",
            "-i",
            freebusy_fixture_path(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["busy"].as_array().unwrap().len(), 2);
    assert_eq!(report["free"].as_array().unwrap().len(), 3);
    assert_eq!(report["busy"][0]["end"], "2026-03-03T11:00:00Z");
}

#[test]
fn slots_json_report_honours_min_duration() {
    let output = calsvc()
        .args([
            "slots",
            "--from",
            "2026-03-03T08:00:00Z",
            "--to",
            "2026-03-03T17:00:00Z",
            "--json",
            "--min-duration",
            "150",
            "-i",
            freebusy_fixture_path(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let free = report["free"].as_array().unwrap();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0]["start"], "2026-03-03T14:00:00Z");
    assert_eq!(report["busy"].as_array().unwrap().len(), 2);
}

#[test]
fn slots_empty_busy_list_frees_whole_range() {
    calsvc()
        .args(["slots", "--from", "2026-03-03T09:00:00Z", "--to", "2026-03-03T12:00:00Z"])
        .write_stdin("[]")
        .assert()
        .success()
        .stdout(predicate::str::contains("(180 min)"));
}

#[test]
fn slots_fully_busy_range() {
    let input = r#"{"busy":[{"start":"2026-03-03T09:00:00Z","end":"2026-03-03T12:00:00Z"}]}"#;

    calsvc()
        .args(["slots", "--from", "2026-03-03T09:00:00Z", "--to", "2026-03-03T12:00:00Z"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("No free time in range."));
}

#[test]
fn slots_rejects_unsorted_busy_list() {
    let input = r#"[
        {"start":"2026-03-03T11:00:00Z","end":"2026-03-03T11:30:00Z"},
        {"start":"2026-03-03T10:00:00Z","end":"2026-03-03T10:30:00Z"}
    ]"#;

    calsvc()
        .args(["slots", "--from", "2026-03-03T09:00:00Z", "--to", "2026-03-03T12:00:00Z"])
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not sorted"));
}

#[test]
fn slots_rejects_inverted_range() {
    calsvc()
        .args(["slots", "--from", "2026-03-03T12:00:00Z", "--to", "2026-03-03T09:00:00Z"])
        .write_stdin("[]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid query range"));
}

#[test]
fn slots_rejects_bad_timestamp() {
    calsvc()
        .args(["slots", "--from", "tomorrow", "--to", "2026-03-03T09:00:00Z"])
        .write_stdin("[]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --from"));
}

#[test]
fn slots_rejects_malformed_json() {
    calsvc()
        .args(["slots", "--from", "2026-03-03T09:00:00Z", "--to", "2026-03-03T12:00:00Z"])
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse busy list JSON"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Online subcommands: failures before any request is sent
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn events_without_credentials_fails() {
    let dir = tempfile::tempdir().unwrap();

    calsvc()
        .current_dir(dir.path())
        .env("CALENDAR_CREDENTIALS", dir.path().join("missing.json"))
        .env_remove("CALENDAR_TIMEZONE")
        .arg("events")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read client secrets"));
}

#[test]
fn invalid_timezone_in_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("calsvc.env");
    std::fs::write(&config, "CALENDAR_TIMEZONE=Not/AZone\n").unwrap();

    calsvc()
        .env_remove("CALENDAR_TIMEZONE")
        .args(["--config", config.to_str().unwrap(), "auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timezone"));
}

#[test]
fn create_requires_summary() {
    calsvc()
        .args(["create", "--start", "2026-03-03T10:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--summary"));
}

#[test]
fn help_lists_subcommands() {
    calsvc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("availability"))
        .stdout(predicate::str::contains("slots"))
        .stdout(predicate::str::contains("create"));
}
