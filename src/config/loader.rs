//! Reading configuration files from disk
//!
//! A file is a YAML mapping whose top-level keys are either file-level
//! defaults or environment sections. Environment sections are pruned from
//! the defaults and the requested one is overlaid on top of them.

use regex_lite::{Captures, Regex};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use super::error::ConfigError;
use super::merge::deep_merge;
use super::value::ConfigValue;

/// Environment names always treated as environment sections
pub const KNOWN_ENVIRONMENTS: &[&str] = &["development", "test", "staging", "production"];

/// A parsed configuration file
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Parsed tree
    pub tree: ConfigValue,

    /// SHA-256 digest of the raw file bytes (hex)
    pub digest: String,
}

/// Read and parse a YAML configuration file.
///
/// When `interpolate` is given, `${NAME}` references are expanded through
/// it before parsing.
pub fn read_document(
    path: &Path,
    interpolate: Option<&dyn Fn(&str) -> Option<String>>,
) -> Result<SourceDocument, ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("Invalid UTF-8: {}", e),
    })?;
    // Editors on some platforms prepend a byte order mark
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);

    let contents = match interpolate {
        Some(lookup) => interpolate_env(contents, lookup),
        None => contents.to_string(),
    };

    let tree = parse_document(&contents).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    Ok(SourceDocument { tree, digest })
}

/// Parse YAML text into a mapping tree. An empty document is an empty mapping.
pub fn parse_document(contents: &str) -> Result<ConfigValue, String> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(contents).map_err(|e| format!("YAML parse error: {}", e))?;
    match ConfigValue::from_yaml(yaml) {
        ConfigValue::Map(map) => Ok(ConfigValue::Map(map)),
        value if value.is_null() => Ok(ConfigValue::map()),
        ConfigValue::Seq(_) => Err("expected a mapping at the document root, found a sequence".to_string()),
        ConfigValue::Scalar(_) => Err("expected a mapping at the document root, found a scalar".to_string()),
    }
}

fn interpolation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern is valid")
    })
}

/// Expand `${NAME}` references; unset names expand to the empty string
pub fn interpolate_env<F>(contents: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    interpolation_pattern()
        .replace_all(contents, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Split a file tree into its effective overlay for `environment`.
///
/// Keys naming a known environment (or `environment` itself) are removed
/// from the file-level defaults; the requested environment's mapping is
/// then merged over those defaults. Returns the overlay and whether the
/// requested environment section was found.
pub fn select_environment(
    document: ConfigValue,
    environment: Option<&str>,
    known_environments: &[String],
) -> (ConfigValue, bool) {
    let ConfigValue::Map(mut map) = document else {
        return (ConfigValue::map(), false);
    };

    let selected = environment.and_then(|env| map.get(env).cloned());

    map.retain(|key, _| {
        let is_environment = KNOWN_ENVIRONMENTS.contains(&key.as_str())
            || known_environments.iter().any(|known| known == key)
            || environment == Some(key.as_str());
        !is_environment
    });

    match selected {
        Some(section @ ConfigValue::Map(_)) => (deep_merge(ConfigValue::Map(map), section), true),
        // An empty section (`production:` with nothing under it) still counts
        Some(section) if section.is_null() => (ConfigValue::Map(map), true),
        _ => (ConfigValue::Map(map), false),
    }
}
