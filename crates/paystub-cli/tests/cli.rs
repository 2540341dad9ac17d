use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATEMENT: &str = "\
PAY STATEMENT
Pay Period: 12/14/2025 - 12/27/2025
Pay Date: 01/02/2026

GROSS PAY: $5,971.61
Federal Tax: $685.12
State Tax: $0.00
Social Security: $370.24
Medicare: $86.59

401k Employee: $1,313.75
401k Employer Match: $328.44
Health Insurance: $0.00

NET PAY: $3,515.91
";

fn paystub(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("paystub").unwrap();
    // Keep the user's config file out of the way.
    cmd.env("XDG_CONFIG_HOME", config_dir.path())
        .env("HOME", config_dir.path());
    cmd
}

fn write_statement(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn process_prints_json_array() {
    let dir = TempDir::new().unwrap();
    let input = write_statement(&dir, "stub.txt", STATEMENT);

    let output = paystub(&dir).arg("process").arg(&input).output().unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let record = &records[0];
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(record["gross_amount"].as_f64(), Some(5971.61));
    assert_eq!(record["net_amount"].as_f64(), Some(3515.91));
    assert_eq!(record["employee_401k_contribution"].as_f64(), Some(1313.75));
    assert_eq!(record["pay_date"], "2026-01-02");
    assert_eq!(record["pay_period"], "12/14/2025 - 12/27/2025");
    assert_eq!(record["source_system"], "OCR");
}

#[test]
fn process_target_month_filters() {
    let dir = TempDir::new().unwrap();
    let input = write_statement(&dir, "stub.txt", STATEMENT);

    paystub(&dir)
        .args(["process", "--target-month", "2026-01"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"net_amount\": 3515.91"));

    paystub(&dir)
        .args(["process", "--target-month", "2025-12"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn process_rejects_bad_target_month() {
    let dir = TempDir::new().unwrap();
    let input = write_statement(&dir, "stub.txt", STATEMENT);

    paystub(&dir)
        .args(["process", "--target-month", "Jan 2026"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("YYYY-MM"));
}

#[test]
fn process_empty_text_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_statement(&dir, "blank.txt", "   \n");

    paystub(&dir)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not extract text"));
}

#[test]
fn process_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    paystub(&dir)
        .args(["process", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_unsupported_format_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_statement(&dir, "stub.docx", STATEMENT);

    paystub(&dir)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file format"));
}

#[test]
fn process_csv_and_details() {
    let dir = TempDir::new().unwrap();
    let input = write_statement(&dir, "stub.txt", STATEMENT);

    paystub(&dir)
        .args(["process", "--format", "csv", "--show-details", "--validate"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pay_period,gross_amount,net_amount"))
        .stderr(predicate::str::contains("Net pay resolved by: LargestCandidate"));
}

#[test]
fn process_uses_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_statement(&dir, "stub.txt", "Gross Pay $2,000.00\nDeposit $1,500.00\nNet Pay $1,400.00");
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "extraction": { "noise_floor": 1600 } }"#).unwrap();

    paystub(&dir)
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"net_amount\": 1400.0"));
}

#[test]
fn batch_writes_outputs_and_sorted_summary() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    let out = dir.path().join("out");
    fs::create_dir_all(&inputs).unwrap();

    fs::write(inputs.join("b.txt"), STATEMENT).unwrap();
    fs::write(
        inputs.join("a.txt"),
        STATEMENT.replace("01/02/2026", "12/19/2025"),
    )
    .unwrap();
    fs::write(inputs.join("c.txt"), " ").unwrap();

    paystub(&dir)
        .arg("batch")
        .arg(format!("{}/*.txt", inputs.display()))
        .arg("--output-dir")
        .arg(&out)
        .args(["--summary", "--continue-on-error", "-j", "2"])
        .assert()
        .success();

    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("b.json")).unwrap()).unwrap();
    assert_eq!(record[0]["pay_date"], "2026-01-02");
    assert!(!out.join("c.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[1].starts_with("a.txt,success,2025-12-19"));
    assert!(rows[2].starts_with("b.txt,success,2026-01-02"));
    assert!(rows[3].starts_with("c.txt,error"));
}

#[test]
fn batch_stops_on_error_by_default() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("blank.txt"), "").unwrap();

    paystub(&dir)
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("paystub.json");

    paystub(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    paystub(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.context_window", "60"])
        .assert()
        .success();

    paystub(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.context_window"])
        .assert()
        .success()
        .stdout(predicate::str::diff("60\n"));

    paystub(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}
