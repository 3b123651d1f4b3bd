//! Loading config files into a store

use eb_config::{ConfigError, ConfigStore, ConfigValue, ErbRenderer, RootDirResolver, Setting};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_store() -> ConfigStore {
    let mut env = HashMap::new();
    env.insert("EB_FIXTURE_DB_HOST".to_string(), "db.prod.internal".to_string());
    ConfigStore::default()
        .with_resolver(RootDirResolver::new(fixture_root()))
        .with_evaluator(ErbRenderer::with_env(env))
}

fn setting(namespace: &str, option_name: &str, value: &str) -> Setting {
    Setting {
        namespace: namespace.to_string(),
        option_name: option_name.to_string(),
        value: value.to_string(),
    }
}

#[test]
fn test_load_production_overlay() {
    let mut store = fixture_store();
    store.load(Some("production"), "eb.yml").unwrap();

    assert_eq!(store.environment(), Some("production"));
    assert_eq!(store.strategy(), Some("blue_green"));
    assert_eq!(store.secrets_dir(), Some("~/.aws"));

    let package = store.package().unwrap();
    assert_eq!(package.dir, "pkg");
    assert!(package.verbose);
    assert_eq!(package.includes, vec!["**/*", ".ebextensions/**/*", "bin/**/*"]);
    assert_eq!(
        package.exclude_dirs,
        vec!["pkg", "tmp", "log", "test-reports", "features", "spec", "docs"]
    );

    assert_eq!(
        store.option_settings().unwrap(),
        vec![
            setting("aws:autoscaling:launchconfiguration", "InstanceType", "m5.large"),
            setting("aws:autoscaling:launchconfiguration", "EC2KeyName", "deploy"),
            setting("aws:elasticbeanstalk:application:environment", "RAILS_ENV", "production"),
            setting("aws:elasticbeanstalk:application:environment", "DB_HOST", "db.prod.internal"),
            setting("aws:elasticbeanstalk:application:environment", "WORKERS", "4"),
        ]
    );
    assert_eq!(
        store.inactive_settings().unwrap(),
        vec![setting("aws:autoscaling:launchconfiguration", "SecurityGroups", "legacy")]
    );
}

#[test]
fn test_load_development_overlay() {
    let mut store = fixture_store();
    store.load(Some("development"), "eb.yml").unwrap();

    assert_eq!(store.strategy(), Some("rolling"));
    assert_eq!(
        store.find_option_setting_value("RAILS_ENV").unwrap(),
        Some("development".to_string())
    );
    assert_eq!(
        store.find_option_setting_value("InstanceType").unwrap(),
        Some("t3.small".to_string())
    );
    assert_eq!(store.find_option_setting_value("WORKERS").unwrap(), None);
}

#[test]
fn test_load_without_environment_ignores_sections() {
    let mut store = fixture_store();
    store.load(None, "eb.yml").unwrap();

    assert_eq!(store.environment(), None);
    assert_eq!(store.strategy(), Some("inplace_update"));
    assert!(store.get("production").is_none());
    assert!(store.get("development").is_none());
    assert_eq!(store.sources().len(), 1);
    assert!(!store.sources()[0].environment_found);
}

#[test]
fn test_load_unknown_environment_uses_file_defaults() {
    let mut store = fixture_store();
    store.load(Some("qa"), "eb.yml").unwrap();

    assert_eq!(store.environment(), Some("qa"));
    assert_eq!(store.strategy(), Some("inplace_update"));
    assert!(!store.sources()[0].environment_found);
}

#[test]
fn test_load_twice_is_idempotent() {
    let mut once = fixture_store();
    once.load(Some("production"), "eb.yml").unwrap();

    let mut twice = fixture_store();
    twice.load(Some("production"), "eb.yml").unwrap();
    twice.load(Some("production"), "eb.yml").unwrap();

    assert_eq!(once.tree(), twice.tree());
    assert_eq!(twice.sources().len(), 2);
    assert_eq!(twice.sources()[0].digest, twice.sources()[1].digest);
}

#[test]
fn test_set_option_after_load() {
    let mut store = fixture_store();
    store.load(Some("production"), "eb.yml").unwrap();

    store.set_option("app", "PORT", "8080").unwrap();
    store
        .set_option("aws:autoscaling:launchconfiguration", "InstanceType", "c5.xlarge")
        .unwrap();

    assert_eq!(store.find_option_setting_value("PORT").unwrap(), Some("8080".to_string()));
    assert_eq!(
        store.find_option_setting_value("InstanceType").unwrap(),
        Some("c5.xlarge".to_string())
    );
    let last = store.option_settings().unwrap().pop().unwrap();
    assert_eq!(last, setting("app", "PORT", "8080"));
}

#[test]
fn test_reload_picks_up_file_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eb.yml");
    fs::write(&path, "production:\n  strategy: rolling\n").unwrap();

    let mut store = ConfigStore::default();
    store.load(Some("production"), &path).unwrap();
    store.set_option("app", "TRANSIENT", "1").unwrap();
    assert_eq!(store.strategy(), Some("rolling"));

    fs::write(&path, "production:\n  strategy: inplace_update\n").unwrap();
    store.reload().unwrap();

    assert_eq!(store.strategy(), Some("inplace_update"));
    assert_eq!(store.find_option_setting_value("TRANSIENT").unwrap(), None);
    assert_eq!(store.sources().len(), 1);
}

#[test]
fn test_load_default_path() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(
        dir.path().join("config/eb.yml"),
        "staging:\n  options:\n    app:\n      PORT: 3000\n",
    )
    .unwrap();

    let mut store = ConfigStore::default().with_resolver(RootDirResolver::new(dir.path()));
    store.load_default(Some("staging")).unwrap();

    assert_eq!(store.find_option_setting_value("PORT").unwrap(), Some("3000".to_string()));
    assert_eq!(store.sources()[0].path, dir.path().join("config/eb.yml"));
}

#[test]
fn test_custom_environment_names_are_pruned() {
    let mut temp = NamedTempFile::new().unwrap();
    writeln!(temp, "uat:\n  strategy: rolling\nshared: 1").unwrap();

    let mut store = ConfigStore::default().with_environments(["uat"]);
    store.load(None, temp.path()).unwrap();

    assert!(store.get("uat").is_none());
    assert_eq!(store.get("shared").and_then(ConfigValue::as_i64), Some(1));
}

#[test]
fn test_interpolation() {
    let mut temp = NamedTempFile::new().unwrap();
    writeln!(temp, "options:\n  app:\n    InstanceType: ${{INSTANCE_TYPE}}").unwrap();

    let mut plain = ConfigStore::default();
    plain.load(None, temp.path()).unwrap();
    assert_eq!(
        plain.find_option_setting_value("InstanceType").unwrap(),
        Some("${INSTANCE_TYPE}".to_string())
    );

    let vars: HashMap<String, String> =
        [("INSTANCE_TYPE".to_string(), "t3.micro".to_string())].into_iter().collect();
    let mut interpolated = ConfigStore::default()
        .with_interpolation_lookup(Box::new(move |name: &str| vars.get(name).cloned()));
    interpolated.load(None, temp.path()).unwrap();
    assert_eq!(
        interpolated.find_option_setting_value("InstanceType").unwrap(),
        Some("t3.micro".to_string())
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let mut store = ConfigStore::default();
    let err = store.load(Some("production"), "/nonexistent/config/eb.yml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(store.sources().is_empty());
    assert_eq!(store.strategy(), Some("blue_green"));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let mut temp = NamedTempFile::new().unwrap();
    writeln!(temp, "options: {{unclosed").unwrap();

    let mut store = ConfigStore::default();
    let err = store.load(None, temp.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_non_mapping_root_is_parse_error() {
    let mut temp = NamedTempFile::new().unwrap();
    writeln!(temp, "- just\n- a list").unwrap();

    let mut store = ConfigStore::default();
    assert!(matches!(
        store.load(None, temp.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_file_extends_disallowed_environments() {
    let mut temp = NamedTempFile::new().unwrap();
    writeln!(temp, "disallow_environments: [staging]\nstaging:\n  strategy: rolling").unwrap();

    let mut store = ConfigStore::default();
    assert!(store.is_environment_allowed("staging"));
    store.load(Some("staging"), temp.path()).unwrap();

    assert_eq!(store.disallowed_environments(), vec!["cucumber", "test", "staging"]);
    assert!(matches!(
        store.ensure_environment_allowed("staging"),
        Err(ConfigError::DisallowedEnvironment(ref env)) if env == "staging"
    ));
}
