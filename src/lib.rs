//! eb-config - deployment settings for application-hosting environments
//!
//! Reads a YAML config file, overlays the section for the target
//! environment on built-in defaults (merging arrays rather than replacing
//! them), and exposes the `options` and `inactive` settings as flat
//! `(namespace, option_name, value)` lists for a deployment tool.

pub mod config;
pub mod logging;
pub mod path;
pub mod settings;

pub use config::{ConfigError, ConfigStore, ConfigValue, LoadedSource, PackageConfig};
pub use path::{PathResolver, RootDirResolver, WorkingDirResolver, DEFAULT_CONFIG_PATH};
pub use settings::Setting;

pub use eb_template::{ErbRenderer, TemplateError, TemplateEvaluator};
