//! Integration tests for the `expiry` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MEDICINE_STRIP: &str = "Paracetamol 500mg EXP: 31/12/2024 BATCH: ABC123";

/// A command isolated from the user's config directory.
fn expiry(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("expiry").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env("HOME", config_home);
    cmd
}

#[test]
fn test_process_json() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("strip.txt");
    fs::write(&input, MEDICINE_STRIP).unwrap();

    let output = expiry(dir.path())
        .args(["process", "--reference-date", "2024-06-15"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["category"], "medicine");
    assert_eq!(json["expiryDate"]["value"], "2024-12-31");
    assert_eq!(json["expiryDate"]["confidence"], "High");
    assert_eq!(json["fields"]["batchNumber"]["value"], "ABC123");
}

#[test]
fn test_process_stdin_text() {
    let dir = TempDir::new().unwrap();

    expiry(dir.path())
        .args(["process", "-", "--format", "text", "--reference-date", "2024-06-15"])
        .write_stdin("Warranty Card Valid up to Date: 22-02-2022")
        .assert()
        .success()
        .stdout(predicate::str::contains("Category: warranty"))
        .stdout(predicate::str::contains("Expiry:   2022-02-22"))
        .stdout(predicate::str::contains("is in the past"));
}

#[test]
fn test_process_category_hint_and_output_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("policy.txt");
    let output = dir.path().join("policy.json");
    fs::write(&input, "Policy No: P-2311 valid till 31/03/2025").unwrap();

    expiry(dir.path())
        .args(["process", "--category", "insurance", "--reference-date", "2024-06-15", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("\"category\": \"insurance\""));
    assert!(written.contains("2025-03-31"));
}

#[test]
fn test_process_with_enrichment() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("strip.txt");
    let enrichment = dir.path().join("llm.json");
    fs::write(&input, MEDICINE_STRIP).unwrap();
    fs::write(
        &enrichment,
        r#"{"category": "medicine", "fields": {"manufacturer": "Micro Labs", "patientName": "John Doe"}}"#,
    )
    .unwrap();

    expiry(dir.path())
        .args(["process", "--reference-date", "2024-06-15", "--enrichment"])
        .arg(&enrichment)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Micro Labs"))
        .stdout(predicate::str::contains("John Doe").not());
}

#[test]
fn test_process_missing_file() {
    let dir = TempDir::new().unwrap();

    expiry(dir.path())
        .args(["process", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_rejects_unknown_category() {
    let dir = TempDir::new().unwrap();

    expiry(dir.path())
        .args(["process", "-", "--category", "passport"])
        .write_stdin(MEDICINE_STRIP)
        .assert()
        .failure();
}

#[test]
fn test_sanitize() {
    let dir = TempDir::new().unwrap();

    expiry(dir.path())
        .args(["sanitize", "-", "--report"])
        .write_stdin("Name: John Doe\nAadhaar 1234 5678 9012\nValid till 12/2026")
        .assert()
        .success()
        .stdout(predicate::str::contains("John Doe").not())
        .stdout(predicate::str::contains("1234 5678 9012").not())
        .stdout(predicate::str::contains("Valid till 12/2026"))
        .stderr(predicate::str::contains("aadhaar"));
}

#[test]
fn test_classify() {
    let dir = TempDir::new().unwrap();

    expiry(dir.path())
        .args(["classify", "-"])
        .write_stdin("DRIVING LICENCE\nDL No MH12 20110012345\nSubscription valid till 09/03/2041")
        .assert()
        .success()
        .stdout(predicate::str::contains("Category: other"))
        .stdout(predicate::str::contains("license_rule"));

    let output = expiry(dir.path())
        .args(["classify", "-", "--json"])
        .write_stdin(MEDICINE_STRIP)
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["category"], "medicine");
    assert_eq!(json["confidence"], 85);
}

#[test]
fn test_batch_with_summary() {
    let dir = TempDir::new().unwrap();
    let docs = dir.path().join("docs");
    let out = dir.path().join("out");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("strip.txt"), MEDICINE_STRIP).unwrap();
    fs::write(docs.join("card.txt"), "Warranty Card Valid up to Date: 22-02-2022").unwrap();
    fs::write(docs.join("notes.md"), "ignored").unwrap();

    let pattern = format!("{}/*", docs.display());
    expiry(dir.path())
        .args(["batch", &pattern, "--summary", "--reference-date", "2024-06-15", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    assert!(out.join("strip.json").exists());
    assert!(out.join("card.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("strip.txt,success,medicine,85,2024-12-31,High"));
}

#[test]
fn test_batch_no_matches() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.txt", dir.path().display());

    expiry(dir.path())
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_config_init_get_set() {
    let dir = TempDir::new().unwrap();

    expiry(dir.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("expiry").join("config.json").exists());

    expiry(dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    expiry(dir.path())
        .args(["config", "set", "expiry.near_window", "20"])
        .assert()
        .success();

    expiry(dir.path())
        .args(["config", "get", "expiry.near_window"])
        .assert()
        .success()
        .stdout(predicate::str::diff("20\n"));

    expiry(dir.path())
        .args(["config", "set", "expiry.weak_window", "500"])
        .assert()
        .failure();

    expiry(dir.path())
        .args(["config", "get", "expiry.no_such_key"])
        .assert()
        .failure();
}
