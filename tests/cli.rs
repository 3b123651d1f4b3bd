//! End-to-end runs of the `eb-config` binary

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = "\
disallow_environments: [qa]
options:
  app:
    PORT: 8080
    SECRET: \"<%= 'abc' %>\"
inactive:
  app:
    DEBUG: true
production:
  strategy: rolling
  options:
    app:
      PORT: 9090
qa:
  strategy: rolling
";

fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("eb.yml");
    fs::write(&path, CONFIG).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_eb-config"))
        .args(args)
        .env_remove("EB_CONFIG_LOG")
        .output()
        .expect("failed to run eb-config")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_settings_json() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&["settings", "--env", "production", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        settings,
        serde_json::json!([
            {"namespace": "app", "option_name": "PORT", "value": "9090"},
            {"namespace": "app", "option_name": "SECRET", "value": "abc"},
        ])
    );
}

#[test]
fn test_settings_human_inactive() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&[
        "settings",
        "--inactive",
        "--human",
        "--config",
        config.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "app DEBUG=true\n");
}

#[test]
fn test_find_value() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&["find", "SECRET", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "abc\n");
}

#[test]
fn test_find_missing_exits_1() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&["find", "MISSING", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("MISSING"));
}

#[test]
fn test_show_merged_tree() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&["show", "--env", "production", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["environment"], "production");
    assert_eq!(tree["strategy"], "rolling");
    assert_eq!(tree["options"]["app"]["PORT"], 9090);
    assert_eq!(
        tree["disallow_environments"],
        serde_json::json!(["cucumber", "test", "qa"])
    );
    assert!(tree.get("production").is_none());
}

#[test]
fn test_sources_lists_loaded_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&["sources", "--env", "production", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let sources: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let sources = sources.as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["path"], config.to_str().unwrap());
    assert_eq!(sources[0]["environment"], "production");
    assert_eq!(sources[0]["environment_found"], true);
    assert_eq!(sources[0]["digest"].as_str().unwrap().len(), 64);
}

#[test]
fn test_builtin_disallowed_environment_exits_2() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&["show", "--env", "test", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_file_disallowed_environment_exits_2() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = run(&["show", "--env", "qa", "--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("qa"));
}

#[test]
fn test_missing_config_exits_1() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yml");
    let output = run(&["show", "--config", missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_root_anchors_default_path() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(dir.path().join("config/eb.yml"), CONFIG).unwrap();
    let output = run(&["find", "PORT", "--root", dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "8080\n");
}
