//! Option settings
//!
//! The `options` and `inactive` sub-trees are shaped
//! `namespace -> option_name -> value`. These helpers flatten them into
//! [`Setting`] lists, look settings up by option name, and write them back.
//! Values carrying a `<%= ... %>` expression are resolved on every read.

use eb_template::{first_expression, TemplateEvaluator};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ConfigError, ConfigMap, ConfigValue};

/// A resolved `(namespace, option_name, value)` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub namespace: String,
    pub option_name: String,
    pub value: String,
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={}", self.namespace, self.option_name, self.value)
    }
}

/// Build a [`Setting`], resolving the first template expression in `value`.
///
/// When the value contains an expression, the rendered expression replaces
/// the whole value.
pub fn to_option_setting(
    namespace: &str,
    option_name: &str,
    value: &ConfigValue,
    evaluator: &dyn TemplateEvaluator,
) -> Result<Setting, ConfigError> {
    let raw = value.to_string();
    let value = match first_expression(&raw) {
        Some(expression) => evaluator
            .render(expression)
            .map_err(|source| ConfigError::Template {
                value: raw.clone(),
                source,
            })?,
        None => raw,
    };

    Ok(Setting {
        namespace: namespace.to_string(),
        option_name: option_name.to_string(),
        value,
    })
}

/// Namespaces of a settings tree, skipping any that are not mappings
fn namespaces<'a>(
    tree: &'a ConfigValue,
) -> impl Iterator<Item = (&'a String, &'a ConfigMap)> + 'a {
    tree.as_map()
        .into_iter()
        .flat_map(|map| map.iter())
        .filter_map(|(namespace, options)| options.as_map().map(|options| (namespace, options)))
}

/// Flatten a settings tree in namespace order, then option order
pub fn generate_settings(
    tree: &ConfigValue,
    evaluator: &dyn TemplateEvaluator,
) -> Result<Vec<Setting>, ConfigError> {
    let mut result = Vec::new();
    for (namespace, options) in namespaces(tree) {
        for (option_name, value) in options {
            result.push(to_option_setting(namespace, option_name, value, evaluator)?);
        }
    }
    Ok(result)
}

/// First setting named `name`, scanning namespaces in order
pub fn find_setting(
    name: &str,
    tree: &ConfigValue,
    evaluator: &dyn TemplateEvaluator,
) -> Result<Option<Setting>, ConfigError> {
    for (namespace, options) in namespaces(tree) {
        if let Some(value) = options.get(name) {
            return to_option_setting(namespace, name, value, evaluator).map(Some);
        }
    }
    Ok(None)
}

/// Value of the first setting named `name`
pub fn find_setting_value(
    name: &str,
    tree: &ConfigValue,
    evaluator: &dyn TemplateEvaluator,
) -> Result<Option<String>, ConfigError> {
    Ok(find_setting(name, tree, evaluator)?.map(|setting| setting.value))
}

/// Store `value` under `namespace.option_name`, creating the namespace.
///
/// The value is resolved once so a broken expression fails here, but the
/// raw value is what gets stored.
pub fn set_setting(
    tree: &mut ConfigValue,
    namespace: &str,
    option_name: &str,
    value: ConfigValue,
    evaluator: &dyn TemplateEvaluator,
) -> Result<(), ConfigError> {
    let setting = to_option_setting(namespace, option_name, &value, evaluator)?;
    tracing::debug!(
        namespace = %setting.namespace,
        option = %setting.option_name,
        "setting option"
    );

    if let Some(options) = tree.child_map_mut(&setting.namespace).as_map_mut() {
        options.insert(setting.option_name, value);
    }
    Ok(())
}
