//! Corruption recovery tests for liftlog.
//!
//! These tests verify the system can handle:
//! - Corrupted data files
//! - Data files missing required fields
//! - Legacy data files
//! - Broken configuration

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftlog"));
    cmd.env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.path().join("data"));
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn data_path(dir: &TempDir, file: &str) -> PathBuf {
    dir.path().join("data").join(file)
}

fn write_data(dir: &TempDir, file: &str, contents: &str) {
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(data_path(dir, file), contents).expect("Failed to write data file");
}

#[test]
fn test_corrupted_data_file() {
    let dir = setup_test_dir();
    write_data(&dir, "liftlog_data_v2.json", "{ invalid json }}}}");

    // Reading falls back to a fresh log without touching the file
    cli(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bench Press"));
    assert_eq!(
        fs::read_to_string(data_path(&dir, "liftlog_data_v2.json")).unwrap(),
        "{ invalid json }}}}"
    );

    // The next mutation replaces it with a valid log
    cli(&dir)
        .args(["log", "--weight", "60", "--reps", "8", "--date", "2024-01-01"])
        .assert()
        .success();

    let contents = fs::read_to_string(data_path(&dir, "liftlog_data_v2.json")).unwrap();
    let log: serde_json::Value = serde_json::from_str(&contents).expect("Expected valid JSON");
    assert_eq!(log["exercises"]["Bench Press"].as_array().unwrap().len(), 1);
}

#[test]
fn test_data_file_with_invalid_utf8() {
    let dir = setup_test_dir();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(data_path(&dir, "liftlog_data_v2.json"), [0xff, 0xfe, b'{']).unwrap();

    cli(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bench Press"));
    assert_eq!(
        fs::read(data_path(&dir, "liftlog_data_v2.json")).unwrap(),
        vec![0xff, 0xfe, b'{']
    );

    cli(&dir)
        .args(["log", "--weight", "60", "--reps", "8", "--date", "2024-01-01"])
        .assert()
        .success();

    let contents = fs::read_to_string(data_path(&dir, "liftlog_data_v2.json")).unwrap();
    let log: serde_json::Value = serde_json::from_str(&contents).expect("Expected valid JSON");
    assert_eq!(log["exercises"]["Bench Press"].as_array().unwrap().len(), 1);
}

#[test]
fn test_data_file_without_exercises() {
    let dir = setup_test_dir();
    write_data(&dir, "liftlog_data_v2.json", r#"{"version": 2, "unit": "lb"}"#);

    cli(&dir)
        .arg("exercises")
        .assert()
        .success()
        .stdout(predicate::str::contains("* Bench Press"));
}

#[test]
fn test_truncated_data_file() {
    let dir = setup_test_dir();
    write_data(
        &dir,
        "liftlog_data_v2.json",
        r#"{"version":2,"unit":"kg","exercises":{"Bench Press":[{"id":"a","date":"2024-01-01","weig"#,
    );

    cli(&dir).arg("history").assert().success();
}

#[test]
fn test_empty_data_file() {
    let dir = setup_test_dir();
    write_data(&dir, "liftlog_data_v2.json", "");

    cli(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Baseline: –"));
}

#[test]
fn test_legacy_data_file_migrated() {
    let dir = setup_test_dir();
    write_data(
        &dir,
        "gt_data_v1.json",
        r#"{"version":1,"unit":"lb","exercises":{"Squat":[{"id":"s1","date":"2024-01-01","weightDisplay":315,"reps":5}]}}"#,
    );

    cli(&dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("315.0 lb"));

    let contents = fs::read_to_string(data_path(&dir, "liftlog_data_v2.json"))
        .expect("Migrated log should be saved");
    let log: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(log["version"], 2);
    assert_eq!(log["unit"], "lb");
    assert!(log["exercises"]["Squat"][0]["weightKg"].is_f64());
    assert!(log["exercises"]["Squat"][0].get("weightDisplay").is_none());

    // Legacy file is left in place for manual recovery
    assert!(data_path(&dir, "gt_data_v1.json").exists());
}

#[test]
fn test_current_file_wins_over_legacy() {
    let dir = setup_test_dir();
    write_data(
        &dir,
        "gt_data_v1.json",
        r#"{"version":1,"unit":"kg","exercises":{"Old":[]}}"#,
    );
    write_data(
        &dir,
        "liftlog_data_v2.json",
        r#"{"version":2,"unit":"kg","exercises":{"New":[]}}"#,
    );

    cli(&dir)
        .arg("exercises")
        .assert()
        .success()
        .stdout(predicate::str::contains("New"))
        .stdout(predicate::str::contains("Old").not());
}

#[test]
fn test_broken_config_is_reported() {
    let dir = setup_test_dir();
    let config_dir = dir.path().join("config").join("liftlog");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[defaults\nunit = ").unwrap();

    cli(&dir)
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TOML error"));
}

#[test]
fn test_missing_import_file() {
    let dir = setup_test_dir();

    cli(&dir)
        .arg("import")
        .arg(dir.path().join("does-not-exist.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));

    cli(&dir)
        .arg("exercises")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bench Press"));
}
