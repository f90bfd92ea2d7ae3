// piisift/tests/cli_integration_tests.rs
//! Command-line integration tests for the `piisift` binary.
//!
//! The binary is run with `assert_cmd`; YAML and JSON fixtures are written to
//! `tempfile` files so every test is isolated. Stdout is never a terminal
//! here, so output carries no color codes.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;
use test_log::test;

fn piisift() -> Command {
    let mut cmd = Command::cargo_bin("piisift").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn fixture(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

fn analyze_json(args: &[&str]) -> Result<Value> {
    let output = piisift().arg("analyze").args(args).output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn test_analyze_scan_finds_valid_pesel_only() -> Result<()> {
    let json = analyze_json(&[
        "--text",
        "pesel 92032100157, drugi 92032100150",
        "--scan",
        "--surface-rejections",
    ])?;
    let entities = json["entities"].as_array().unwrap();
    assert!(entities.iter().any(|e| e["text"] == "92032100157" && e["entity_type"] == "PL_PESEL"));
    assert!(!entities.iter().any(|e| e["text"] == "92032100150"));
    assert!(json["rejected"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["text"] == "92032100150" && r["reason"] == "INVALID_CHECKSUM"));
    Ok(())
}

#[test]
fn test_analyze_external_candidates_with_mode() -> Result<()> {
    let candidates = fixture(
        r#"[
  {"type": "persName", "start": 10, "end": 22, "text": "Jan Kowalski", "score": 0.55, "recognizer": "ner"},
  {"type": "persName", "start": 27, "end": 30, "text": "she", "score": 0.9, "recognizer": "ner"}
]"#,
    )?;
    let text = "Signed by Jan Kowalski and she agreed";
    let path = candidates.path().to_str().unwrap();

    let balanced = analyze_json(&["--text", text, "--candidates", path])?;
    assert_eq!(balanced["mode"], "balanced");
    assert_eq!(balanced["entities"].as_array().unwrap().len(), 0);
    assert_eq!(balanced["stats"]["by_reason"]["LOW_SCORE"], 1);
    assert_eq!(balanced["stats"]["by_reason"]["PRONOUN"], 1);

    let recall = analyze_json(&["--text", text, "--candidates", path, "--mode", "high_recall"])?;
    let entities = recall["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["entity_type"], "PERSON");
    Ok(())
}

#[test]
fn test_analyze_reads_stdin_and_allow_list() -> Result<()> {
    let candidates = fixture(
        r#"[{"entity_type": "PERSON", "start": 0, "end": 10, "score": 0.95, "recognizer_id": "ner"}]"#,
    )?;
    let output = piisift()
        .args([
            "analyze",
            "--candidates",
            candidates.path().to_str().unwrap(),
            "--allow",
            "Anna Nowak",
            "--surface-rejections",
        ])
        .write_stdin("Anna Nowak wrote this.")
        .output()?;
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["rejected"][0]["reason"], "ALLOW_LIST");
    Ok(())
}

#[test]
fn test_analyze_unknown_mode_fails() {
    piisift()
        .args(["analyze", "--text", "hello", "--mode", "paranoid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("paranoid"));
}

#[test]
fn test_analyze_oversized_text_fails() {
    let big = "x".repeat(10_001);
    piisift()
        .args(["analyze", "--text", &big])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Malformed input"));
}

#[test]
fn test_validate_exit_codes() {
    piisift()
        .args(["validate", "pesel", "92032100157"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid").and(predicate::str::contains("1992-03-21")));
    piisift()
        .args(["validate", "luhn", "4532111111111111"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invalid"));
    piisift()
        .args(["validate", "iban", "GB82 WEST 1234 5698 7654 32"])
        .assert()
        .success();
}

#[test]
fn test_patterns_reports_rejections() -> Result<()> {
    let file = fixture(
        r#"
recognizers:
  - name: risky
    entity_type: THING
    patterns:
      - name: nested
        regex: '(a*)*b'
        score: 0.5
      - name: fine
        regex: '\bthing\b'
        score: 0.5
"#,
    )?;
    piisift()
        .args(["patterns", file.path().to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("NESTED_QUANTIFIER").and(predicate::str::contains("risky")));
    Ok(())
}

#[test]
fn test_patterns_accepts_clean_file() -> Result<()> {
    let file = fixture(
        r#"
recognizers:
  - name: employee
    entity_type: EMPLOYEE_ID
    patterns:
      - name: emp
        regex: '\bEMP-\d{6}\b'
        score: 0.7
"#,
    )?;
    piisift()
        .args(["patterns", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("All 1 patterns"));
    Ok(())
}

#[test]
fn test_modes_lists_defaults() {
    piisift()
        .arg("modes")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("high_recall")
                .and(predicate::str::contains("balanced *"))
                .and(predicate::str::contains("high_precision")),
        );
}

#[test]
fn test_health_reports_initialized() -> Result<()> {
    let output = piisift().arg("health").output()?;
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["status"], "initialized");
    assert_eq!(json["current_mode"], "balanced");
    assert_eq!(json["generation"], 1);
    assert!(json["loaded_recognizers"].as_array().unwrap().iter().any(|r| r == "pl_pesel"));
    Ok(())
}

#[test]
fn test_health_degraded_on_bad_recognizers() -> Result<()> {
    let file = fixture(
        r#"
recognizers:
  - name: pl_pesel
    entity_type: PL_PESEL
    patterns:
      - name: evil
        regex: '(\d+)+$'
        score: 0.5
"#,
    )?;
    let output = piisift()
        .args(["health", "--recognizers", file.path().to_str().unwrap()])
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["error"]["code"], "PATTERN_REJECTED");
    Ok(())
}
