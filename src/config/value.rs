//! Configuration tree values
//!
//! A closed tagged variant over mappings, sequences and scalars. Mapping
//! keys keep their insertion order so namespace and option iteration
//! follows the order they were written in.

use indexmap::IndexMap;
use std::fmt;

/// Leaf value in a configuration tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A node in a configuration tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Map(IndexMap<String, ConfigValue>),
    Seq(Vec<ConfigValue>),
    Scalar(Scalar),
}

/// Ordered mapping of keys to values
pub type ConfigMap = IndexMap<String, ConfigValue>;

impl Default for ConfigValue {
    fn default() -> Self {
        ConfigValue::Scalar(Scalar::Null)
    }
}

impl ConfigValue {
    /// The null scalar
    pub const NULL: ConfigValue = ConfigValue::Scalar(Scalar::Null);

    /// An empty mapping
    pub fn map() -> Self {
        ConfigValue::Map(IndexMap::new())
    }

    /// Build a mapping from key/value pairs, keeping their order
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConfigValue)>,
    {
        ConfigValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Parse a YAML document into a tree
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(source)?;
        Ok(Self::from_yaml(yaml))
    }

    /// Convert a parsed YAML value, dropping any YAML tags
    pub fn from_yaml(yaml: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match yaml {
            Yaml::Null => ConfigValue::NULL,
            Yaml::Bool(b) => ConfigValue::Scalar(Scalar::Bool(b)),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Scalar(Scalar::Int(i))
                } else {
                    n.as_f64()
                        .map(|f| ConfigValue::Scalar(Scalar::Float(f)))
                        .unwrap_or(ConfigValue::NULL)
                }
            }
            Yaml::String(s) => ConfigValue::Scalar(Scalar::String(s)),
            Yaml::Sequence(items) => {
                ConfigValue::Seq(items.into_iter().map(Self::from_yaml).collect())
            }
            Yaml::Mapping(mapping) => ConfigValue::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key(k), Self::from_yaml(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Self::from_yaml(tagged.value),
        }
    }

    /// Convert to a JSON value (key order follows serde_json's map)
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            ConfigValue::Scalar(Scalar::Null) => Json::Null,
            ConfigValue::Scalar(Scalar::Bool(b)) => Json::Bool(*b),
            ConfigValue::Scalar(Scalar::Int(i)) => Json::Number((*i).into()),
            ConfigValue::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            ConfigValue::Scalar(Scalar::String(s)) => Json::String(s.clone()),
            ConfigValue::Seq(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            ConfigValue::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Scalar(Scalar::Null))
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Look up a direct child of a mapping
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_map()?.get(key)
    }

    /// Look up a value by dot-separated path
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut current = self;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Mutable child of a mapping, created as an empty mapping when missing.
    ///
    /// A non-mapping `self` is replaced by an empty mapping first, and a
    /// non-mapping child is replaced likewise.
    pub fn child_map_mut(&mut self, key: &str) -> &mut ConfigValue {
        if !self.is_map() {
            *self = ConfigValue::map();
        }
        let ConfigValue::Map(map) = self else {
            unreachable!("replaced with a mapping above")
        };
        let child = map.entry(key.to_string()).or_insert_with(ConfigValue::map);
        if !child.is_map() {
            *child = ConfigValue::map();
        }
        child
    }

    /// Write `value` at a dot-separated path, creating intermediate mappings
    pub fn set_path(&mut self, path: &str, value: ConfigValue) {
        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };

        let mut current = self;
        for part in parts {
            current = current.child_map_mut(part);
        }
        if !current.is_map() {
            *current = ConfigValue::map();
        }
        if let ConfigValue::Map(map) = current {
            map.insert(last.to_string(), value);
        }
    }
}

/// String form of a YAML mapping key
fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => String::new(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// Setting-value string form: scalars print bare, null prints empty,
/// sequences and mappings print as compact JSON.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Scalar(scalar) => fmt::Display::fmt(scalar, f),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<Scalar> for ConfigValue {
    fn from(scalar: Scalar) -> Self {
        ConfigValue::Scalar(scalar)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Scalar(Scalar::String(s))
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Scalar(Scalar::Float(f))
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(items: Vec<T>) -> Self {
        ConfigValue::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Map(map)
    }
}
