//! Built-in deployment defaults
//!
//! Hardcoded defaults seeded into every store before overrides and
//! loaded files are merged on top. Array defaults are merged with, not
//! replaced by, later layers.

use serde::{Deserialize, Serialize};

use super::value::ConfigValue;

/// Packaging settings (the `package` sub-tree)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Output directory for the deployment archive (default: "pkg")
    #[serde(default = "default_package_dir")]
    pub dir: String,

    /// Verbose packaging output (default: false)
    #[serde(default)]
    pub verbose: bool,

    /// Globs of files to include
    #[serde(default)]
    pub includes: Vec<String>,

    /// Individual files to leave out
    #[serde(default)]
    pub exclude_files: Vec<String>,

    /// Directories to leave out
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
}

fn default_package_dir() -> String {
    "pkg".to_string()
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            dir: default_package_dir(),
            verbose: false,
            includes: vec!["**/*".to_string(), ".ebextensions/**/*".to_string()],
            exclude_files: Vec::new(),
            exclude_dirs: vec![
                "pkg".to_string(),
                "tmp".to_string(),
                "log".to_string(),
                "test-reports".to_string(),
            ],
        }
    }
}

impl PackageConfig {
    pub fn to_value(&self) -> ConfigValue {
        ConfigValue::from_entries([
            ("dir", ConfigValue::from(self.dir.as_str())),
            ("verbose", ConfigValue::from(self.verbose)),
            ("includes", ConfigValue::from(self.includes.clone())),
            ("exclude_files", ConfigValue::from(self.exclude_files.clone())),
            ("exclude_dirs", ConfigValue::from(self.exclude_dirs.clone())),
        ])
    }
}

/// Built-in default configuration values
#[derive(Debug, Clone)]
pub struct BuiltinDefaults {
    /// Loaded environment (default: none)
    pub environment: Option<String>,

    /// Directory holding deployment credentials (default: "~/.aws")
    pub secrets_dir: String,

    /// Environments that must never be deployed (default: cucumber, test)
    pub disallow_environments: Vec<String>,

    /// Deployment strategy (default: "blue_green")
    pub strategy: String,

    /// Packaging settings
    pub package: PackageConfig,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            environment: None,
            secrets_dir: "~/.aws".to_string(),
            disallow_environments: vec!["cucumber".to_string(), "test".to_string()],
            strategy: "blue_green".to_string(),
            package: PackageConfig::default(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to a tree for merging, with empty `options` and `inactive`
    pub fn to_value(&self) -> ConfigValue {
        let environment = self
            .environment
            .as_deref()
            .map(ConfigValue::from)
            .unwrap_or_default();

        ConfigValue::from_entries([
            ("environment", environment),
            ("secrets_dir", ConfigValue::from(self.secrets_dir.as_str())),
            (
                "disallow_environments",
                ConfigValue::from(self.disallow_environments.clone()),
            ),
            ("strategy", ConfigValue::from(self.strategy.as_str())),
            ("package", self.package.to_value()),
            ("options", ConfigValue::map()),
            ("inactive", ConfigValue::map()),
        ])
    }
}
