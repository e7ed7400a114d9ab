//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn adaptest() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("adaptest").unwrap();
    cmd.env_remove("ADAPTEST_BANK")
        .env_remove("ADAPTEST_MAX_ITEMS");
    cmd
}

fn bank(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../banks")
        .join(name)
}

#[test]
fn help_output() {
    adaptest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Computerized adaptive testing engine"));
}

#[test]
fn version_output() {
    adaptest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("adaptest"));
}

#[test]
fn validate_biology_bank() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("15 questions"))
        .stdout(predicate::str::contains("[125] WARNING: question is inactive"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_algebra_bank() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(bank("algebra.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("8 questions"))
        .stdout(predicate::str::contains("All item banks valid"));
}

#[test]
fn validate_directory() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(bank(""))
        .assert()
        .success()
        .stdout(predicate::str::contains("Introductory Biology"))
        .stdout(predicate::str::contains("Algebra I"));
}

#[test]
fn validate_nonexistent_file() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_rejects_ids_shared_across_files() {
    let dir = TempDir::new().unwrap();
    let content = std::fs::read_to_string(bank("algebra.toml")).unwrap();
    std::fs::write(dir.path().join("a.toml"), &content).unwrap();
    std::fs::write(
        dir.path().join("b.toml"),
        content.replace("id = \"alg-1\"", "id = \"alg-2\""),
    )
    .unwrap();

    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate question id 201"));
}

#[test]
fn skills_lists_bank_skills() {
    adaptest()
        .arg("skills")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("cells"))
        .stdout(predicate::str::contains("genetics"))
        .stdout(predicate::str::contains("ecology"))
        .stdout(predicate::str::contains("3 skill(s), 15 question(s)"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created adaptest.toml"))
        .stdout(predicate::str::contains("Created banks/example.toml"));

    assert!(dir.path().join("adaptest.toml").exists());
    assert!(dir.path().join("banks/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_then_run_uses_config_bank() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args(["run", "--simulate", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arithmetic"))
        .stdout(predicate::str::contains("Session finished"));
}

#[test]
fn simulated_run_writes_report() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.json");

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("run")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .args(["--simulate", "--true-theta", "0.5", "--seed", "7"])
        .args(["--max-items", "5"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Session finished"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["finished"], true);
    assert_eq!(report["max_items"], 5);
    let asked = report["asked"].as_array().unwrap();
    assert!(!asked.is_empty() && asked.len() <= 5);
    assert_eq!(report["transcript"].as_array().unwrap().len(), asked.len());
    assert_eq!(report["skills"].as_array().unwrap().len(), 3);

    adaptest()
        .arg("report")
        .arg("--input")
        .arg(&output)
        .args(["--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| Skill | Theta |"));
}

#[test]
fn simulated_runs_with_same_seed_match() {
    let dir = TempDir::new().unwrap();
    let run = || {
        adaptest()
            .current_dir(dir.path())
            .env("HOME", dir.path())
            .arg("run")
            .arg("--bank")
            .arg(bank("biology.toml"))
            .args(["--simulate", "--seed", "11", "--true-theta", "-0.5"])
            .output()
            .unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn run_logs_session_lifecycle_to_stderr() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("RUST_LOG")
        .arg("run")
        .arg("--bank")
        .arg(bank("algebra.toml"))
        .args(["--simulate", "--seed", "3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("running session"))
        .stderr(predicate::str::contains("session finished"))
        .stdout(predicate::str::contains("running session").not());
}

#[test]
fn scoped_run_only_asks_scoped_items() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("run")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .args(["--simulate", "--skills", "cells", "--category", "Analysis"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cells item 105"))
        .stdout(predicate::str::contains("Session finished after 1 item(s)"));
}

#[test]
fn run_rejects_unknown_skill() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("run")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .args(["--simulate", "--skills", "astronomy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scope"));
}

#[test]
fn run_rejects_item_cap_above_limit() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("run")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .args(["--simulate", "--max-items", "500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid item cap 500"));
}

#[test]
fn run_without_bank_fails() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args(["run", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no item bank given"));
}

#[test]
fn interactive_run_reprompts_and_grades() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("run")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .args(["--skills", "cells", "--max-items", "1"])
        .write_stdin("z\nB\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Please enter one of the listed options"))
        .stdout(predicate::str::contains(": correct"))
        .stdout(predicate::str::contains("Session finished after 1 item(s)"));
}

#[test]
fn interactive_quit_stops_session() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("run")
        .arg("--bank")
        .arg(bank("biology.toml"))
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopping early."))
        .stdout(predicate::str::contains("Session stopped after 0 item(s)"));
}

#[test]
fn report_nonexistent_file() {
    adaptest()
        .arg("report")
        .arg("--input")
        .arg("no_such_report.json")
        .assert()
        .failure();
}
