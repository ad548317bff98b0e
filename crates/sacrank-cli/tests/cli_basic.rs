//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated HOME and data directory
//! and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_sacrank"))
        .env("HOME", home)
        .env_remove("SACRANK_ENV")
        .env_remove("SACRANK_DATA_DIR")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_exams(dir: &Path) {
    std::fs::write(
        dir.join("exams.csv"),
        "Bio SAC,2025-08-11,High,Biology\n\
         Lit essay,2025-08-20,Low,Literature\n\
         Chem test,2025-08-04,Medium,Chemistry\n\
         Broken,not-a-date,Low,Chemistry\n",
    )
    .unwrap();
}

#[test]
fn test_rank_ratio_json() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    write_exams(data.path());
    let data_dir = data.path().to_str().unwrap();

    let (stdout, stderr, code) = run_cli(
        home.path(),
        &[
            "rank", "--data-dir", data_dir, "--strategy", "ratio", "--now", "2025-08-04", "--json",
        ],
    );
    assert_eq!(code, 0, "rank failed: {stderr}");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["strategy"], "ratio");
    let entries = parsed["entries"].as_array().unwrap();
    let names: Vec<&str> = entries
        .iter()
        .map(|e| e["record"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Chem test", "Bio SAC", "Lit essay"]);
    assert_eq!(entries[0]["priority"], "max");
    assert_eq!(entries[0]["band"], "overdue");

    assert_eq!(parsed["skipped"].as_array().unwrap().len(), 1);
    assert!(stderr.contains("skipped line 4"));
}

#[test]
fn test_rank_text_output() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    write_exams(data.path());

    let (stdout, _, code) = run_cli(
        home.path(),
        &[
            "rank",
            "--data-dir",
            data.path().to_str().unwrap(),
            "--strategy",
            "ratio",
            "--now",
            "2025-08-04",
        ],
    );
    assert_eq!(code, 0);
    let first = stdout.lines().next().unwrap();
    assert!(first.contains("OVERDUE"));
    assert!(first.contains("MAX"));
    assert!(first.contains("Chem test"));
    assert!(stdout.contains("0.429"));
}

#[test]
fn test_rank_unknown_strategy_fails() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    write_exams(data.path());

    let (_, stderr, code) = run_cli(
        home.path(),
        &["rank", "--data-dir", data.path().to_str().unwrap(), "--strategy", "fifo"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("fifo"));
}

#[test]
fn test_rank_invalid_decay_fails() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    write_exams(data.path());

    let (_, stderr, code) = run_cli(
        home.path(),
        &["rank", "--data-dir", data.path().to_str().unwrap(), "--decay-k", "0"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("decay_k"));
}

#[test]
fn test_rank_performance_defaults_bad_target() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    write_exams(data.path());
    std::fs::write(
        data.path().join("target_scores.csv"),
        "Subject,Target_Score\nBiology,0\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_cli(
        home.path(),
        &[
            "rank",
            "--data-dir",
            data.path().to_str().unwrap(),
            "--difficulty",
            "performance",
            "--now",
            "2025-08-01",
            "--json",
        ],
    );
    assert_eq!(code, 0, "rank failed: {stderr}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let warnings = parsed["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["name"], "Bio SAC");
    assert!(stderr.contains("given default priority"));
}

#[test]
fn test_exams_add_and_list() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let data_dir = data.path().to_str().unwrap();

    let (_, stderr, code) = run_cli(
        home.path(),
        &[
            "exams", "add", "Physics SAC", "2025-09-01", "--subject", "Physics", "--difficulty",
            "High", "--data-dir", data_dir,
        ],
    );
    assert_eq!(code, 0, "add failed: {stderr}");

    let (_, _, code) = run_cli(
        home.path(),
        &["exams", "add", "Bad", "tomorrow", "--subject", "Physics", "--data-dir", data_dir],
    );
    assert_ne!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["exams", "list", "--json", "--data-dir", data_dir]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let list = parsed.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Physics SAC");
    assert_eq!(list[0]["difficulty"]["level"], "High");
}

#[test]
fn test_subjects_averages_and_progress() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    std::fs::write(
        data.path().join("study_scores.csv"),
        "SAC,Subject,Score\nSAC 1,Biology,70\nSAC 2,Biology,80\nTotal,Biology,35\n",
    )
    .unwrap();
    std::fs::write(
        data.path().join("target_scores.csv"),
        "Subject,Target_Score\nBiology,40\n",
    )
    .unwrap();
    let data_dir = data.path().to_str().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["subjects", "averages", "--data-dir", data_dir]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Biology: 75"));

    let (stdout, _, code) = run_cli(home.path(), &["subjects", "progress", "--data-dir", data_dir]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Need +5.0 points (target: 40.0/50)"));
}

#[test]
fn test_config_set_get() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "ranking.strategy"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "complement");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "ranking.strategy", "ratio"]);
    assert_eq!(code, 0);

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "ranking.strategy"]);
    assert_eq!(stdout.trim(), "ratio");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "ranking.strategy", "fifo"]);
    assert_ne!(code, 0);

    let (_, _, code) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_data_dir_flag_overrides_configured_dir() {
    let home = tempfile::tempdir().unwrap();
    let configured = tempfile::tempdir().unwrap();
    let flagged = tempfile::tempdir().unwrap();
    std::fs::write(
        configured.path().join("exams.csv"),
        "Configured exam,2025-08-11,High,Biology\n",
    )
    .unwrap();
    write_exams(flagged.path());

    let (_, _, code) = run_cli(
        home.path(),
        &["config", "set", "data.dir", configured.path().to_str().unwrap()],
    );
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["exams", "list", "--json"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Configured exam"));

    let (stdout, _, code) = run_cli(
        home.path(),
        &["exams", "list", "--json", "--data-dir", flagged.path().to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Bio SAC"));
    assert!(!stdout.contains("Configured exam"));
}

#[test]
fn test_rank_ratio_with_subject_difficulty_mixes_scales_consistently() {
    let home = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    std::fs::write(
        data.path().join("exams.csv"),
        "Lit essay,2025-08-11,Low,Literature\nBio SAC,2025-08-11,High,Biology\n",
    )
    .unwrap();
    std::fs::write(data.path().join("difficulty.csv"), "Subject,difficulty\nBiology,0.9\n").unwrap();

    let (stdout, stderr, code) = run_cli(
        home.path(),
        &[
            "rank",
            "--data-dir",
            data.path().to_str().unwrap(),
            "--difficulty",
            "subject",
            "--strategy",
            "ratio",
            "--now",
            "2025-08-09",
            "--json",
        ],
    );
    assert_eq!(code, 0, "rank failed: {stderr}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = parsed["entries"].as_array().unwrap();
    assert_eq!(entries[0]["record"]["name"], "Bio SAC");
    assert_eq!(entries[0]["record"]["difficulty"]["scalar"], 0.9);
    assert_eq!(entries[1]["record"]["name"], "Lit essay");
}
