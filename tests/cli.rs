// Exercises the non-interactive paths of the binary: they must work without
// a TTY.

use assert_cmd::Command;
use tempfile::tempdir;

fn typlax(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("typlax").unwrap();
    // keep logs and default state out of the real home directory
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join("config"));
    cmd
}

#[test]
fn help_lists_the_main_flags() {
    let dir = tempdir().unwrap();
    let output = typlax(dir.path()).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for flag in ["--mode", "--prompt", "--history", "--export-history", "--no-keyboard"] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn list_modes_prints_the_catalog() {
    let dir = tempdir().unwrap();
    let output = typlax(dir.path()).arg("--list-modes").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 6);
    assert!(stdout.contains("broken-glass"));
    assert!(stdout.contains("Night to Sunrise"));
}

#[test]
fn unknown_mode_is_rejected() {
    let dir = tempdir().unwrap();
    typlax(dir.path())
        .args(["--mode", "rocket", "--list-modes"])
        .assert()
        .failure();
}

#[test]
fn export_of_empty_history_writes_header() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("history.db");
    let csv = dir.path().join("out.csv");

    typlax(dir.path())
        .arg("--history-db")
        .arg(&db)
        .arg("--export-history")
        .arg(&csv)
        .assert()
        .success();

    let text = std::fs::read_to_string(&csv).unwrap();
    assert!(text.starts_with("mode,final_wpm,raw_wpm,accuracy"));
    assert_eq!(text.lines().count(), 1);
}

#[test]
fn save_config_persists_flags() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("prefs.json");

    typlax(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--mode", "tv-static", "--no-keyboard", "--save-config", "--list-modes"])
        .assert()
        .success();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config).unwrap()).unwrap();
    assert_eq!(saved["default_mode"], "tv-static");
    assert_eq!(saved["show_keyboard"], false);
    assert_eq!(saved["hud_refresh_ms"], 500);
}

#[test]
fn interactive_run_requires_a_tty() {
    let dir = tempdir().unwrap();
    typlax(dir.path())
        .arg("--history-db")
        .arg(dir.path().join("history.db"))
        .args(["-p", "hi"])
        .assert()
        .failure();
}
