//! Basic CLI E2E tests.
//!
//! Every test points STUDYTIMER_DATA_DIR at its own temp directory, so the
//! user's real config and ledger are never touched.

use assert_cmd::Command;
use chrono::Local;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("studytimer").unwrap();
    cmd.env("STUDYTIMER_DATA_DIR", dir.path())
        .env_remove("STUDYTIMER_ENV")
        .env("RUST_LOG", "off");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn presets_lists_every_preset() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(cli(&dir).arg("presets"));
    for name in ["classic", "extended", "test", "custom"] {
        assert!(out.contains(name), "missing {name} in:\n{out}");
    }
    assert!(out.contains("* classic"));
}

#[test]
fn config_set_then_get() {
    let dir = TempDir::new().unwrap();
    stdout_of(cli(&dir).args(["config", "set", "timer.preset", "extended"]));
    let out = stdout_of(cli(&dir).args(["config", "get", "timer.preset"]));
    assert_eq!(out.trim(), "extended");

    let listed = stdout_of(cli(&dir).args(["config", "list"]));
    let json: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(json["timer"]["preset"], "extended");
}

#[test]
fn config_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["config", "set", "timer.study_minutes", "0"])
        .assert()
        .failure();
    cli(&dir)
        .args(["config", "get", "timer.nonexistent"])
        .assert()
        .failure();
}

#[test]
fn stats_on_empty_ledger_reports_zero() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(cli(&dir).args(["stats", "--json"]));
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["date"], Local::now().date_naive().format("%Y-%m-%d").to_string());
    assert_eq!(json["session_count"], 0.0);
    assert_eq!(json["total_study_time"], 0.0);
}

#[test]
fn stats_reads_existing_ledger() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("data.json"),
        r#"{"2024-05-01": {"session_count": 2.5, "total_study_time": 62.5, "last_updated": "2024-05-01T20:00:00"}}"#,
    )
    .unwrap();

    let out = stdout_of(cli(&dir).args(["stats", "--date", "2024-05-01", "--json"]));
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["session_count"], 2.5);
    assert_eq!(json["total_study_time"], 62.5);

    let text = stdout_of(cli(&dir).args(["stats", "--all"]));
    assert!(text.contains("2024-05-01"));
}

#[test]
fn run_session_saves_on_quit() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(
        cli(&dir)
            .args(["run", "--test"])
            .write_stdin("status\nstart\nstop\nquit\n"),
    );
    assert!(out.contains("Study"));
    assert!(out.contains("Today:"));

    let ledger = std::fs::read_to_string(dir.path().join("data.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&ledger).unwrap();
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert!(json.get(&today).is_some(), "no entry for {today} in {ledger}");
}

#[test]
fn run_exits_cleanly_on_eof() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["run", "--preset", "25/5"])
        .write_stdin("help\n")
        .assert()
        .success();
}
