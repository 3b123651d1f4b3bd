//! The configuration store
//!
//! Holds the merged tree (built-in defaults, caller overrides, loaded
//! files) and the accessors for the `options` and `inactive` settings
//! sub-trees. The store is an ordinary value: build one, hand it to whoever
//! needs it, and mutate it through `&mut`.

use chrono::{DateTime, Utc};
use eb_template::{EnvLookup, ErbRenderer, TemplateEvaluator};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::defaults::{BuiltinDefaults, PackageConfig};
use super::error::ConfigError;
use super::loader::{read_document, select_environment};
use super::merge::{deep_merge, merge_into};
use super::value::ConfigValue;
use crate::path::{PathResolver, WorkingDirResolver, DEFAULT_CONFIG_PATH};
use crate::settings::{self, Setting};

const OPTIONS_KEY: &str = "options";
const INACTIVE_KEY: &str = "inactive";

static EMPTY: ConfigValue = ConfigValue::Scalar(super::value::Scalar::Null);

/// A config file merged into the store
#[derive(Debug, Clone, Serialize)]
pub struct LoadedSource {
    /// Resolved file path
    pub path: PathBuf,

    /// Environment requested for this load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Whether the file had a section for the environment
    pub environment_found: bool,

    /// SHA-256 digest of raw file bytes
    pub digest: String,

    /// When the file was merged
    pub loaded_at: DateTime<Utc>,
}

/// Merged deployment configuration
pub struct ConfigStore {
    tree: ConfigValue,
    seed: ConfigValue,
    sources: Vec<LoadedSource>,
    resolver: Box<dyn PathResolver>,
    evaluator: Box<dyn TemplateEvaluator>,
    interpolation: Option<EnvLookup>,
    environments: Vec<String>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("tree", &self.tree)
            .field("sources", &self.sources)
            .field("interpolation", &self.interpolation.is_some())
            .field("environments", &self.environments)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(ConfigValue::map())
    }
}

impl ConfigStore {
    /// Build a store from the built-in defaults with `overrides` merged on top
    pub fn new(overrides: ConfigValue) -> Self {
        let seed = deep_merge(BuiltinDefaults::default().to_value(), overrides);
        Self {
            tree: seed.clone(),
            seed,
            sources: Vec::new(),
            resolver: Box::new(WorkingDirResolver),
            evaluator: Box::new(ErbRenderer::new()),
            interpolation: None,
            environments: Vec::new(),
        }
    }

    /// Use `resolver` to anchor relative config paths
    pub fn with_resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Use `evaluator` to resolve `<%= ... %>` expressions
    pub fn with_evaluator(mut self, evaluator: impl TemplateEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Expand `${NAME}` references in config files from the process
    /// environment before parsing
    pub fn with_interpolation(mut self, enabled: bool) -> Self {
        self.interpolation = if enabled {
            Some(Box::new(|name: &str| std::env::var(name).ok()))
        } else {
            None
        };
        self
    }

    /// Expand `${NAME}` references in config files through `lookup`
    pub fn with_interpolation_lookup(mut self, lookup: EnvLookup) -> Self {
        self.interpolation = Some(lookup);
        self
    }

    /// Treat these top-level file keys as environment sections as well
    pub fn with_environments<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments.extend(names.into_iter().map(Into::into));
        self
    }

    /// Load `config/eb.yml` relative to the resolver's anchor
    pub fn load_default(&mut self, environment: Option<&str>) -> Result<(), ConfigError> {
        self.load(environment, DEFAULT_CONFIG_PATH)
    }

    /// Merge a config file into the store.
    ///
    /// File-level defaults are merged first, then the section for
    /// `environment` when the file has one. Loading the same file twice
    /// leaves the tree as it was after the first load.
    pub fn load(
        &mut self,
        environment: Option<&str>,
        source_path: impl AsRef<Path>,
    ) -> Result<(), ConfigError> {
        let source_path = source_path.as_ref();
        let path = if source_path.is_absolute() {
            source_path.to_path_buf()
        } else {
            self.resolver.resolve(source_path)
        };
        tracing::debug!(path = %path.display(), environment, "loading config");

        let interpolate = self
            .interpolation
            .as_ref()
            .map(|lookup| lookup.as_ref() as &dyn Fn(&str) -> Option<String>);
        let document = read_document(&path, interpolate)?;
        let (overlay, environment_found) =
            select_environment(document.tree, environment, &self.environments);

        if let Some(env) = environment {
            if !environment_found {
                tracing::warn!(
                    path = %path.display(),
                    environment = env,
                    "no section for environment, using file defaults only"
                );
            }
        }

        merge_into(&mut self.tree, overlay);
        if let Some(env) = environment {
            self.tree.set_path("environment", ConfigValue::from(env));
        }

        tracing::info!(
            path = %path.display(),
            environment,
            digest = %document.digest,
            "config loaded"
        );
        self.sources.push(LoadedSource {
            path,
            environment: environment.map(str::to_string),
            environment_found,
            digest: document.digest,
            loaded_at: Utc::now(),
        });
        Ok(())
    }

    /// Reset to the construction-time defaults, forgetting loaded files
    pub fn clear(&mut self) {
        tracing::debug!(sources = self.sources.len(), "clearing config");
        self.tree = self.seed.clone();
        self.sources.clear();
    }

    /// Reset, then load every previously loaded file again in order
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let previous = std::mem::take(&mut self.sources);
        self.clear();
        for source in previous {
            self.load(source.environment.as_deref(), &source.path)?;
        }
        Ok(())
    }

    /// The whole merged tree
    pub fn tree(&self) -> &ConfigValue {
        &self.tree
    }

    /// Files merged so far, oldest first
    pub fn sources(&self) -> &[LoadedSource] {
        &self.sources
    }

    /// Value at a dot-separated path
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        self.tree.get_path(path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(ConfigValue::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(ConfigValue::as_bool)
    }

    /// Write a value at a dot-separated path
    pub fn set(&mut self, path: &str, value: impl Into<ConfigValue>) {
        self.tree.set_path(path, value.into());
    }

    /// The loaded environment, if any
    pub fn environment(&self) -> Option<&str> {
        self.get_str("environment")
    }

    pub fn strategy(&self) -> Option<&str> {
        self.get_str("strategy")
    }

    pub fn secrets_dir(&self) -> Option<&str> {
        self.get_str("secrets_dir")
    }

    /// Environment names that must never be deployed
    pub fn disallowed_environments(&self) -> Vec<&str> {
        self.get("disallow_environments")
            .and_then(ConfigValue::as_seq)
            .map(|items| items.iter().filter_map(ConfigValue::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_environment_allowed(&self, environment: &str) -> bool {
        !self.disallowed_environments().contains(&environment)
    }

    pub fn ensure_environment_allowed(&self, environment: &str) -> Result<(), ConfigError> {
        if self.is_environment_allowed(environment) {
            Ok(())
        } else {
            Err(ConfigError::DisallowedEnvironment(environment.to_string()))
        }
    }

    /// Typed view of the `package` sub-tree
    pub fn package(&self) -> Result<PackageConfig, ConfigError> {
        let value = self.get("package").map(ConfigValue::to_json).unwrap_or_default();
        serde_json::from_value(value).map_err(|e| ConfigError::Deserialize(format!("package: {}", e)))
    }

    /// The `options` sub-tree
    pub fn options(&self) -> &ConfigValue {
        self.tree.get(OPTIONS_KEY).unwrap_or(&EMPTY)
    }

    /// The `inactive` sub-tree
    pub fn inactive(&self) -> &ConfigValue {
        self.tree.get(INACTIVE_KEY).unwrap_or(&EMPTY)
    }

    pub fn option_settings(&self) -> Result<Vec<Setting>, ConfigError> {
        settings::generate_settings(self.options(), self.evaluator.as_ref())
    }

    pub fn inactive_settings(&self) -> Result<Vec<Setting>, ConfigError> {
        settings::generate_settings(self.inactive(), self.evaluator.as_ref())
    }

    pub fn find_option_setting(&self, name: &str) -> Result<Option<Setting>, ConfigError> {
        settings::find_setting(name, self.options(), self.evaluator.as_ref())
    }

    pub fn find_option_setting_value(&self, name: &str) -> Result<Option<String>, ConfigError> {
        settings::find_setting_value(name, self.options(), self.evaluator.as_ref())
    }

    pub fn find_inactive_setting(&self, name: &str) -> Result<Option<Setting>, ConfigError> {
        settings::find_setting(name, self.inactive(), self.evaluator.as_ref())
    }

    pub fn find_inactive_setting_value(&self, name: &str) -> Result<Option<String>, ConfigError> {
        settings::find_setting_value(name, self.inactive(), self.evaluator.as_ref())
    }

    /// Set an option, creating its namespace when missing
    pub fn set_option(
        &mut self,
        namespace: &str,
        option_name: &str,
        value: impl Into<ConfigValue>,
    ) -> Result<(), ConfigError> {
        let options = self.tree.child_map_mut(OPTIONS_KEY);
        settings::set_setting(options, namespace, option_name, value.into(), self.evaluator.as_ref())
    }

    /// Set an inactive option, creating its namespace when missing
    pub fn set_inactive_option(
        &mut self,
        namespace: &str,
        option_name: &str,
        value: impl Into<ConfigValue>,
    ) -> Result<(), ConfigError> {
        let inactive = self.tree.child_map_mut(INACTIVE_KEY);
        settings::set_setting(inactive, namespace, option_name, value.into(), self.evaluator.as_ref())
    }
}
