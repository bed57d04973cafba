//! Integration tests for the spellcfg CLI
//!
//! These tests run the binary end-to-end against temporary workspaces

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[allow(deprecated)]
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spellcfg").unwrap();
    cmd.current_dir(dir).arg("--no-color");
    cmd
}

/// Workspace with a root config, a nested config and a sibling config
fn create_workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(
        root.join("cspell.json"),
        r#"{ "words": ["rootword"], "ignorePaths": ["node_modules", "/dist/**"] }"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("app/src")).unwrap();
    fs::write(root.join("app/cspell.json"), r#"{ "words": ["appword"] }"#).unwrap();
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::write(root.join("lib/cspell.json"), r#"{ "words": ["libword"] }"#).unwrap();
    temp
}

#[test]
fn test_help_command() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("excluded-by"));
}

#[test]
fn test_version_command() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(VERSION));
}

#[test]
fn test_settings_merge_ancestor_configs() {
    let temp = create_workspace();
    cli(temp.path())
        .args(["settings", "app/src/main.ts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rootword"))
        .stdout(predicate::str::contains("appword"))
        .stdout(predicate::str::contains("libword").not());
}

#[test]
fn test_settings_json_output() {
    let temp = create_workspace();
    let output = cli(temp.path())
        .args(["--format", "json", "settings", "app/src/main.ts"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let words = report["settings"]["words"].as_array().unwrap();
    assert!(words.contains(&serde_json::json!("appword")));
    assert!(report["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn test_excluded_by_reports_rule() {
    let temp = create_workspace();
    cli(temp.path())
        .args(["excluded-by", "node_modules/pkg/index.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is excluded by"))
        .stdout(predicate::str::contains("node_modules"));

    cli(temp.path())
        .args(["excluded-by", "app/src/main.ts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is not excluded"));
}

#[test]
fn test_check_reports_each_file() {
    let temp = create_workspace();
    cli(temp.path())
        .args(["check", "dist/bundle.js", "app/src/main.ts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dist/bundle.js: excluded"))
        .stdout(predicate::str::contains("app/src/main.ts: checked"));
}

#[test]
fn test_config_files_nearest_first() {
    let temp = create_workspace();
    let output = cli(temp.path())
        .args(["--format", "json", "config-files", "app/src/main.ts"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let files: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("/app/cspell.json"));
    assert!(files[1].ends_with("/cspell.json"));
}

#[test]
fn test_registered_config_applies() {
    let temp = create_workspace();
    let shared = TempDir::new().unwrap();
    let extra = shared.path().join("extra.json");
    fs::write(&extra, r#"{ "words": ["registeredword"] }"#).unwrap();

    cli(temp.path())
        .arg("--register")
        .arg(&extra)
        .args(["settings", "lib/a.rs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("registeredword"))
        .stdout(predicate::str::contains("libword"));
}

#[test]
fn test_host_settings_and_named_folders() {
    let temp = create_workspace();
    let host = temp.path().join("host.json");
    fs::write(
        &host,
        r#"{ "global": { "workspaceRootPath": "${workspaceFolder:app}" }, "folders": { "lib": { "words": ["hostword"] } } }"#,
    )
    .unwrap();

    let output = cli(temp.path())
        .args(["--folder", "app=app", "--folder", "lib=lib", "--host-settings", "host.json"])
        .args(["--format", "json", "settings", "lib/a.rs"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let root = report["settings"]["workspaceRootPath"].as_str().unwrap();
    assert!(root.ends_with("/app"));
    let words = report["settings"]["words"].as_array().unwrap();
    assert!(words.contains(&serde_json::json!("hostword")));
    assert!(words.contains(&serde_json::json!("libword")));
}

#[test]
fn test_unknown_host_folder_fails() {
    let temp = create_workspace();
    fs::write(temp.path().join("host.json"), r#"{ "folders": { "nope": {} } }"#).unwrap();
    cli(temp.path())
        .args(["--host-settings", "host.json", "settings", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_add_and_remove_words() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("cspell.json"), r#"{ "words": [] }"#).unwrap();

    cli(temp.path())
        .args(["add-word", "beta", "Alpha", "beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"));
    let settings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("cspell.json")).unwrap())
            .unwrap();
    assert_eq!(settings["words"], serde_json::json!(["Alpha", "beta"]));

    cli(temp.path())
        .args(["remove-word", "ALPHA"])
        .assert()
        .success();
    let settings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("cspell.json")).unwrap())
            .unwrap();
    assert_eq!(settings["words"], serde_json::json!(["beta"]));
}

#[test]
fn test_language_commands() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .args(["enable-language", "--config", "cfg/cspell.json", "rust", "toml"])
        .assert()
        .success();
    let path = temp.path().join("cfg/cspell.json");
    let settings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(settings["enabledLanguageIds"], serde_json::json!(["rust", "toml"]));

    cli(temp.path())
        .args(["disable-language", "--config", "cfg/cspell.json", "rust", "toml"])
        .assert()
        .success();
    let settings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(settings.get("enabledLanguageIds").is_none());
}

#[test]
fn test_update_of_dynamic_config_fails() {
    let temp = TempDir::new().unwrap();
    cli(temp.path())
        .args(["add-word", "--config", "cspell.config.js", "word"])
        .assert()
        .failure();
    assert!(!temp.path().join("cspell.config.js").exists());
}
